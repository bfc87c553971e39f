use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for an [`Arena`]. Diagnostics only — never used for
/// lookup, only for `debug_assert_eq!` ownership checks and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaId(u64);

impl ArenaId {
    fn next() -> Self {
        ArenaId(NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ArenaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "arena#{}", self.0)
    }
}

/// A scoped allocation domain.
///
/// Everything parented to an arena — [`crate::attribute::Attribute`]s and
/// [`crate::attribute::SideDatum`]s tagged with its id — is expected to move
/// with it as a unit between a [`crate::entry::Entry`] and whatever
/// collaborator currently owns the conversation. The arena itself carries no
/// payload; the payload lives in the sibling `attributes`/`side_data` fields
/// next to it, and their own `Drop` impls do the reclaiming.
#[derive(Debug)]
pub struct Arena {
    id: ArenaId,
}

impl Arena {
    pub fn new() -> Self {
        Self { id: ArenaId::next() }
    }

    pub fn id(&self) -> ArenaId {
        self.id
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}
