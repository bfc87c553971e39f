use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use state_table::ConversationState;

/// Which sub-protocol a request belongs to. Only `Authentication` ever
/// touches the state table (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Authentication,
    Authorization,
    Accounting,
}

/// A control- or reply-list attribute value. Intentionally small: this
/// crate only needs to recognise `Auth-Type` and carry opaque reply data,
/// not model a full attribute dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(String),
    Bytes(Vec<u8>),
    Uint(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: AttrValue,
}

impl Attr {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AttrValue::Text(value.into()),
        }
    }
}

/// The reply's authentication-status attribute: a closed set mirroring the
/// TACACS+/RADIUS continuation statuses of §4.6. `None` on [`Request::status`]
/// means "absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Pass,
    Fail,
    Restart,
    Error,
    Follow,
    GetUser,
    GetPass,
    GetData,
}

impl AuthStatus {
    /// PASS/FAIL/RESTART/ERROR/FOLLOW: terminal, always `discard`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AuthStatus::Pass | AuthStatus::Fail | AuthStatus::Restart | AuthStatus::Error | AuthStatus::Follow
        )
    }
}

/// One in-flight packet exchange, carried through `INIT..DONE` by
/// [`crate::machine::RequestStateMachine`].
pub struct Request<P> {
    pub id: u64,
    pub protocol: Protocol,
    /// The packet-kind name used for `recv <code>`/`send <code>` section
    /// resolution, e.g. `"Access-Request"` or `"Authen-START"`.
    pub packet_code: String,
    pub secret: Vec<u8>,
    /// 12-byte listener identity folded into continuation tokens (§4.6).
    pub listener_id: [u8; 12],
    pub session_id: u32,

    pub inbound: P,
    pub outbound: P,

    pub control: Vec<Attr>,
    pub reply: Vec<Attr>,
    pub status: Option<AuthStatus>,

    pub conv: ConversationState,
    pub reply_timestamp: Option<SystemTime>,

    stopped: AtomicBool,
}

impl<P> Request<P> {
    pub fn new(id: u64, protocol: Protocol, packet_code: impl Into<String>, inbound: P, outbound: P) -> Self {
        Self {
            id,
            protocol,
            packet_code: packet_code.into(),
            secret: Vec::new(),
            listener_id: [0u8; 12],
            session_id: 0,
            inbound,
            outbound,
            control: Vec::new(),
            reply: Vec::new(),
            status: None,
            conv: ConversationState::default(),
            reply_timestamp: None,
            stopped: AtomicBool::new(false),
        }
    }

    /// Signal external cancellation (the `CANCEL` transition of §4.5). May
    /// be called from a different thread while the request sits suspended
    /// at a `YIELD`.
    pub fn cancel(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn stamp_reply_time(&mut self) {
        self.reply_timestamp = Some(SystemTime::now());
    }
}
