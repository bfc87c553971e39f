use std::time::Instant;

use crate::arena::Arena;
use crate::attribute::{Attribute, SideData};
use crate::token::Token;

/// One session's state-table entry.
///
/// `prev`/`next` are slab keys forming the expiry-ordered intrusive list the
/// table maintains; they are private to `crate::table` and have no meaning
/// outside it.
#[derive(Debug)]
pub struct Entry {
    pub(crate) id: u64,
    pub(crate) token: Token,
    pub(crate) expiry: Instant,
    pub(crate) attempt: u32,
    pub(crate) arena: Option<Arena>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) side_data: SideData,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

impl Entry {
    pub(crate) fn fresh(expiry: Instant, attempt: u32) -> Self {
        Self {
            id: 0,
            token: Token::zeroed(),
            expiry,
            attempt,
            arena: None,
            attributes: Vec::new(),
            side_data: SideData::default(),
            prev: None,
            next: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn expiry(&self) -> Instant {
        self.expiry
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Debug-only check that every attribute and side-datum reachable from
    /// this entry is tagged with this entry's own arena (invariant 1). A
    /// violation means ownership was transferred without the arena, which
    /// would desynchronize the two halves of the move.
    #[cfg(debug_assertions)]
    pub(crate) fn verify_ownership(&self) {
        match &self.arena {
            Some(arena) => {
                for attr in &self.attributes {
                    debug_assert_eq!(
                        attr.owner(),
                        arena.id(),
                        "attribute not owned by this entry's arena"
                    );
                }
                for datum in self.side_data.iter() {
                    debug_assert_eq!(
                        datum.owner(),
                        arena.id(),
                        "side datum not owned by this entry's arena"
                    );
                }
            }
            None => {
                debug_assert!(
                    self.attributes.is_empty() && self.side_data.is_empty(),
                    "entry carries attributes/side-data without an arena"
                );
            }
        }
    }
}
