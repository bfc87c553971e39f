//! Concurrent, bounded, time-expiring table for multi-round authentication
//! state: the piece that lets a network-auth server's policy engine suspend
//! a conversation after one packet exchange and resume it, keyed by an
//! opaque token, on the next.
//!
//! This crate knows nothing about wire formats or protocols. Callers
//! implement [`StatefulPacket`] for their own packet type and hand
//! [`handoff::ConversationState`] bundles across the [`StateTable`]
//! boundary; `request-machine` is the crate that actually wires this up to
//! a RADIUS/TACACS+-style state machine.

mod arena;
mod attribute;
mod clock;
mod config;
mod entry;
mod error;
mod handoff;
mod metrics;
mod packet;
mod table;
mod token;

pub mod testing;

pub use arena::{Arena, ArenaId};
pub use attribute::{Attribute, SideData, SideDatum};
pub use clock::{Clock, SystemClock};
pub use config::StateTableConfig;
pub use entry::Entry;
pub use error::{Error, Result};
pub use handoff::ConversationState;
pub use metrics::TableMetricsSnapshot;
pub use packet::StatefulPacket;
pub use table::{StateTable, BUILD_VERSION_TAG};
pub use token::{Token, TOKEN_LEN};
