//! Cooperative, multi-phase driver for one authentication-server request,
//! built on top of `state-table`. Carries a packet through
//! `INIT -> RECV -> PROCESS -> SEND -> DONE`, suspending at the policy
//! interpreter's `YIELD` returns, and applies the authentication
//! sub-protocol's termination disposition (discard vs. carry-forward) once
//! a reply has been produced.

mod error;
mod machine;
mod packet;
mod request;
mod termination;
mod verdict;

pub use error::Error;
pub use machine::{Phase, RequestStateMachine};
pub use packet::{Collaborators, DecodeOutcome, FrameMode, Interpreter, PacketCodec, Scheduler, SectionHandle, SectionResolver, SendError, Sender, SequencedPacket};
pub use request::{Attr, AttrValue, AuthStatus, Protocol, Request};
pub use verdict::Verdict;

pub type Result<T> = std::result::Result<T, Error>;
