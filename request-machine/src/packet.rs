use crate::request::Request;
use crate::verdict::Verdict;

/// Result of handing a raw packet to the wire-format decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    Ok,
    /// Peer closed the connection mid-packet; send no reply.
    ClientAbort,
    /// Malformed packet; skip policy but still send a reply.
    Error,
}

/// Decodes a raw packet in place. Out of scope per the design document —
/// this crate never touches wire bytes itself.
pub trait PacketCodec<P> {
    fn decode(&mut self, packet: &mut P) -> DecodeOutcome;
}

/// Hands an encoded reply to the network. Out of scope; stands in for
/// socket I/O and the shared-secret signing step.
pub trait Sender<P> {
    fn send(&mut self, reply: &P, request_id: u64, secret: &[u8]) -> Result<(), SendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("failed to send reply")]
pub struct SendError;

/// Additional per-packet data the wire-format layer must expose so the
/// machine can name the inbound sequence number (used by termination
/// disposition, §4.6's sequence-wrap handling).
pub trait SequencedPacket {
    fn sequence(&self) -> Option<u8>;
}

/// Opaque handle to a compiled policy section (`recv foo`, `process bar`,
/// `send *`). Resolution and compilation are out of scope; the machine only
/// ever needs to know whether one exists and to hand it back to the
/// interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionHandle(pub u32);

/// Finds a compiled section given a virtual-server scope (implicit in the
/// implementor) and a `(name1, name2)` pair, e.g. `("recv", "Access-Request")`
/// or `("recv", "*")`.
pub trait SectionResolver {
    fn resolve(&self, name1: &str, name2: &str) -> Option<SectionHandle>;
}

/// How a pushed section's frame should be evaluated relative to its caller.
/// Passed straight through to the interpreter collaborator; this crate does
/// not interpret it itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    Inline,
    NewFrame,
}

/// The cooperative policy-language interpreter. `resume` may return
/// [`Verdict::Yield`], at which point the machine itself returns control to
/// its caller (see `crate::machine`). Takes the request itself, not just its
/// id: a running section mutates `req.control`/`req.reply`/`req.status` as a
/// side effect, the same way unlang mutates the live request's VALUE_PAIRs.
pub trait Interpreter<P> {
    fn push(&mut self, section: SectionHandle, default_rcode: Verdict, frame_mode: FrameMode);
    fn resume(&mut self, req: &mut Request<P>) -> Verdict;
}

/// Removes a finished request from the scheduler's ready structure.
/// Accessed only from the `DONE` phase.
pub trait Scheduler {
    fn retire(&mut self, request_id: u64);
}

/// Bundles the collaborator instances the machine needs for one `resume`
/// call. Generic, not trait objects, so the common path monomorphizes.
pub struct Collaborators<'a, C, S, R, I, K> {
    pub codec: &'a mut C,
    pub sender: &'a mut S,
    pub resolver: &'a R,
    pub interpreter: &'a mut I,
    pub scheduler: &'a mut K,
}
