use state_table::{StateTable, StatefulPacket};

use crate::error::Error;
use crate::packet::{Collaborators, DecodeOutcome, FrameMode, Interpreter, PacketCodec, SectionResolver, SendError, Sender, SequencedPacket};
use crate::request::{AttrValue, AuthStatus, Protocol, Request};
use crate::termination;
use crate::verdict::Verdict;

/// The five states of §4.5, plus the implicit `CANCEL` signal which is
/// modelled as a flag on [`Request`] rather than a state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Recv,
    Process,
    Send,
    Done,
}

enum Step {
    Continue,
    Yield,
}

/// Drives one [`Request`] through `INIT -> RECV -> PROCESS -> SEND -> DONE`,
/// suspending at the interpreter's `YIELD` returns and resuming on the next
/// call to [`RequestStateMachine::resume`].
pub struct RequestStateMachine {
    phase: Phase,
    send_pushed: bool,
    last_rcode: Verdict,
}

impl RequestStateMachine {
    pub fn new() -> Self {
        Self {
            phase: Phase::Init,
            send_pushed: false,
            last_rcode: Verdict::Noop,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Advance the machine until it either yields (returns `Verdict::Yield`,
    /// call again later) or reaches `DONE` (returns the last verdict the
    /// interpreter produced).
    pub fn resume<P, C, S, R, I, K>(
        &mut self,
        table: &StateTable,
        req: &mut Request<P>,
        collab: &mut Collaborators<'_, C, S, R, I, K>,
    ) -> Verdict
    where
        P: StatefulPacket + SequencedPacket,
        C: PacketCodec<P>,
        S: Sender<P>,
        R: SectionResolver,
        I: Interpreter<P>,
        K: crate::packet::Scheduler,
    {
        loop {
            let step = match self.phase {
                Phase::Init => {
                    self.do_init(table, req, collab);
                    Step::Continue
                }
                Phase::Recv => self.do_recv(table, req, collab),
                Phase::Process => self.do_process(table, req, collab),
                Phase::Send => self.do_send(table, req, collab),
                Phase::Done => {
                    collab.scheduler.retire(req.id);
                    return self.last_rcode;
                }
            };
            if let Step::Yield = step {
                return Verdict::Yield;
            }
        }
    }

    fn do_init<P, C, S, R, I, K>(&mut self, table: &StateTable, req: &mut Request<P>, collab: &mut Collaborators<'_, C, S, R, I, K>)
    where
        P: StatefulPacket + SequencedPacket,
        C: PacketCodec<P>,
        S: Sender<P>,
        R: SectionResolver,
        I: Interpreter<P>,
        K: crate::packet::Scheduler,
    {
        match collab.codec.decode(&mut req.inbound) {
            DecodeOutcome::ClientAbort => {
                tracing::debug!(request_id = req.id, "peer aborted mid-packet, no reply");
                self.phase = Phase::Done;
                return;
            }
            DecodeOutcome::Error => {
                let err = Error::DecodeFail;
                tracing::warn!(request_id = req.id, error = %err, "skipping policy, still sending a reply");
                self.phase = Phase::Send;
                return;
            }
            DecodeOutcome::Ok => {}
        }

        let section = collab
            .resolver
            .resolve("recv", &req.packet_code)
            .or_else(|| collab.resolver.resolve("recv", "*"));

        let Some(section) = section else {
            tracing::debug!(request_id = req.id, packet_code = %req.packet_code, "no recv section configured");
            self.phase = Phase::Send;
            return;
        };

        if req.protocol == Protocol::Authentication {
            table.restore_from_state(&req.inbound, &mut req.conv);
        }

        collab.interpreter.push(section, Verdict::Noop, FrameMode::NewFrame);
        self.phase = Phase::Recv;
    }

    fn do_recv<P, C, S, R, I, K>(&mut self, table: &StateTable, req: &mut Request<P>, collab: &mut Collaborators<'_, C, S, R, I, K>) -> Step
    where
        P: StatefulPacket + SequencedPacket,
        C: PacketCodec<P>,
        S: Sender<P>,
        R: SectionResolver,
        I: Interpreter<P>,
        K: crate::packet::Scheduler,
    {
        if req.is_stopped() {
            self.handle_external_stop(table, req);
            return Step::Continue;
        }

        let rcode = collab.interpreter.resume(req);
        if matches!(rcode, Verdict::Yield) {
            return Step::Yield;
        }
        self.last_rcode = rcode;

        match rcode {
            Verdict::Handled => {
                self.phase = Phase::Send;
            }
            _ if rcode.is_soft() => {
                self.select_auth_type(req, collab);
            }
            Verdict::Invalid => {
                req.status = Some(AuthStatus::Error);
                self.phase = Phase::Send;
            }
            _ => {
                req.status = Some(AuthStatus::Fail);
                self.phase = Phase::Send;
            }
        }
        Step::Continue
    }

    fn select_auth_type<P, C, S, R, I, K>(&mut self, req: &mut Request<P>, collab: &mut Collaborators<'_, C, S, R, I, K>)
    where
        P: StatefulPacket + SequencedPacket,
        C: PacketCodec<P>,
        S: Sender<P>,
        R: SectionResolver,
        I: Interpreter<P>,
        K: crate::packet::Scheduler,
    {
        let mut found: Option<String> = None;
        let mut extra = 0u32;
        for attr in &req.control {
            if attr.name == "Auth-Type" {
                if found.is_none() {
                    if let AttrValue::Text(text) = &attr.value {
                        found = Some(text.clone());
                    }
                } else {
                    extra += 1;
                }
            }
        }
        if extra > 0 {
            tracing::warn!(request_id = req.id, count = extra, "multiple Auth-Type attributes, using the first");
        }

        let Some(auth_type) = found else {
            req.status = Some(AuthStatus::Fail);
            self.phase = Phase::Send;
            return;
        };

        match auth_type.as_str() {
            "Accept" => {
                req.status = Some(AuthStatus::Pass);
                self.phase = Phase::Send;
            }
            "Reject" => {
                req.status = Some(AuthStatus::Fail);
                self.phase = Phase::Send;
            }
            name => match collab.resolver.resolve("process", name) {
                Some(section) => {
                    collab.interpreter.push(section, Verdict::Noop, FrameMode::NewFrame);
                    self.phase = Phase::Process;
                }
                None => {
                    let err = Error::SectionMissing {
                        name1: "process".to_string(),
                        name2: name.to_string(),
                    };
                    tracing::warn!(request_id = req.id, error = %err);
                    req.status = Some(AuthStatus::Fail);
                    self.phase = Phase::Send;
                }
            },
        }
    }

    fn do_process<P, C, S, R, I, K>(&mut self, table: &StateTable, req: &mut Request<P>, collab: &mut Collaborators<'_, C, S, R, I, K>) -> Step
    where
        P: StatefulPacket + SequencedPacket,
        C: PacketCodec<P>,
        S: Sender<P>,
        R: SectionResolver,
        I: Interpreter<P>,
        K: crate::packet::Scheduler,
    {
        if req.is_stopped() {
            self.handle_external_stop(table, req);
            return Step::Continue;
        }

        let rcode = collab.interpreter.resume(req);
        if matches!(rcode, Verdict::Yield) {
            return Step::Yield;
        }
        self.last_rcode = rcode;

        match rcode {
            Verdict::Ok => {
                req.status = Some(AuthStatus::Pass);
                self.phase = Phase::Send;
            }
            Verdict::Handled => {
                self.phase = Phase::Send;
            }
            _ => {
                req.status = Some(AuthStatus::Fail);
                self.phase = Phase::Send;
            }
        }
        Step::Continue
    }

    fn do_send<P, C, S, R, I, K>(&mut self, table: &StateTable, req: &mut Request<P>, collab: &mut Collaborators<'_, C, S, R, I, K>) -> Step
    where
        P: StatefulPacket + SequencedPacket,
        S: Sender<P>,
        R: SectionResolver,
        I: Interpreter<P>,
    {
        if req.is_stopped() {
            self.handle_external_stop(table, req);
            return Step::Continue;
        }

        if !self.send_pushed {
            self.send_pushed = true;
            let section = collab
                .resolver
                .resolve("send", &req.packet_code)
                .or_else(|| collab.resolver.resolve("send", "*"));
            match section {
                Some(section) => {
                    collab.interpreter.push(section, Verdict::Noop, FrameMode::NewFrame);
                }
                None => {
                    self.finish_send(table, req, collab);
                    return Step::Continue;
                }
            }
        }

        let rcode = collab.interpreter.resume(req);
        if matches!(rcode, Verdict::Yield) {
            return Step::Yield;
        }
        self.last_rcode = rcode;

        self.finish_send(table, req, collab);
        Step::Continue
    }

    fn finish_send<P, C, S, R, I, K>(&mut self, table: &StateTable, req: &mut Request<P>, collab: &mut Collaborators<'_, C, S, R, I, K>)
    where
        P: StatefulPacket + SequencedPacket,
        S: Sender<P>,
    {
        req.stamp_reply_time();

        if req.protocol == Protocol::Authentication {
            if let Err(err) = termination::dispose(table, req) {
                tracing::error!(request_id = req.id, error = %err, "termination disposition failed");
            }
        }

        if let Err(SendError) = collab.sender.send(&req.outbound, req.id, &req.secret) {
            tracing::error!(request_id = req.id, "failed to send reply");
        }

        self.send_pushed = false;
        self.phase = Phase::Done;
    }

    /// `CANCEL` behaves as external stop regardless of which phase it was
    /// observed in: discard authentication state (if applicable) and jump
    /// straight to `DONE`.
    fn handle_external_stop<P: StatefulPacket>(&mut self, table: &StateTable, req: &mut Request<P>) {
        if req.protocol == Protocol::Authentication {
            table.discard(&req.inbound, &mut req.conv);
        }
        tracing::debug!(request_id = req.id, "external stop observed, discarding and finishing");
        self.phase = Phase::Done;
    }
}

impl Default for RequestStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
