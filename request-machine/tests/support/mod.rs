use std::collections::{HashSet, VecDeque};

use request_machine::{
    Collaborators, DecodeOutcome, FrameMode, Interpreter, PacketCodec, Request, SectionHandle,
    SectionResolver, Scheduler, SendError, Sender, SequencedPacket, Verdict,
};
use state_table::{StatefulPacket, Token};

#[derive(Debug, Default, Clone)]
pub struct FakePacket {
    pub token: Option<Token>,
    pub sequence: Option<u8>,
}

impl StatefulPacket for FakePacket {
    fn state_token(&self) -> Option<Token> {
        self.token
    }

    fn set_state_token(&mut self, token: Token) {
        self.token = Some(token);
    }
}

impl SequencedPacket for FakePacket {
    fn sequence(&self) -> Option<u8> {
        self.sequence
    }
}

/// Always reports a clean decode; the wire codec itself is out of scope.
pub struct FakeCodec {
    pub outcome: DecodeOutcome,
}

impl Default for FakeCodec {
    fn default() -> Self {
        Self {
            outcome: DecodeOutcome::Ok,
        }
    }
}

impl PacketCodec<FakePacket> for FakeCodec {
    fn decode(&mut self, _packet: &mut FakePacket) -> DecodeOutcome {
        self.outcome
    }
}

#[derive(Default)]
pub struct FakeSender {
    pub sent: Vec<u64>,
}

impl Sender<FakePacket> for FakeSender {
    fn send(&mut self, _reply: &FakePacket, request_id: u64, _secret: &[u8]) -> Result<(), SendError> {
        self.sent.push(request_id);
        Ok(())
    }
}

/// Knows a fixed set of `(name1, name2)` pairs, each resolving to a distinct
/// handle so assertions can tell which section the machine asked for.
#[derive(Default)]
pub struct FakeResolver {
    known: HashSet<(String, String)>,
}

impl FakeResolver {
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        let mut known = HashSet::new();
        for (a, b) in pairs {
            known.insert((a.to_string(), b.to_string()));
        }
        Self { known }
    }
}

impl SectionResolver for FakeResolver {
    fn resolve(&self, name1: &str, name2: &str) -> Option<SectionHandle> {
        if self.known.contains(&(name1.to_string(), name2.to_string())) {
            Some(SectionHandle(0))
        } else {
            None
        }
    }
}

/// A scripted interpreter: each `resume` pops one step off the front and
/// applies it to the live request before returning its verdict, standing in
/// for a policy section that sets reply attributes as a side effect.
pub enum Step {
    Return(Verdict),
    SetAuthType(&'static str, Verdict),
    SetStatus(request_machine::AuthStatus, Verdict),
}

#[derive(Default)]
pub struct ScriptedInterpreter {
    pub script: VecDeque<Step>,
    pub pushes: Vec<SectionHandle>,
}

impl ScriptedInterpreter {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            script: steps.into(),
            pushes: Vec::new(),
        }
    }
}

impl Interpreter<FakePacket> for ScriptedInterpreter {
    fn push(&mut self, section: SectionHandle, _default_rcode: Verdict, _frame_mode: FrameMode) {
        self.pushes.push(section);
    }

    fn resume(&mut self, req: &mut Request<FakePacket>) -> Verdict {
        match self.script.pop_front() {
            Some(Step::Return(v)) => v,
            Some(Step::SetAuthType(name, v)) => {
                req.control.push(request_machine::Attr::text("Auth-Type", name));
                v
            }
            Some(Step::SetStatus(status, v)) => {
                req.status = Some(status);
                v
            }
            None => Verdict::Noop,
        }
    }
}

#[derive(Default)]
pub struct FakeScheduler {
    pub retired: Vec<u64>,
}

impl Scheduler for FakeScheduler {
    fn retire(&mut self, request_id: u64) {
        self.retired.push(request_id);
    }
}

pub fn collab<'a>(
    codec: &'a mut FakeCodec,
    sender: &'a mut FakeSender,
    resolver: &'a FakeResolver,
    interpreter: &'a mut ScriptedInterpreter,
    scheduler: &'a mut FakeScheduler,
) -> Collaborators<'a, FakeCodec, FakeSender, FakeResolver, ScriptedInterpreter, FakeScheduler> {
    Collaborators {
        codec,
        sender,
        resolver,
        interpreter,
        scheduler,
    }
}
