use std::any::Any;

use crate::arena::ArenaId;

/// A session-state attribute: an opaque name/value pair adopted into an
/// entry's arena. Equivalent to a `VALUE_PAIR` chained off `entry->state_ctx`
/// in the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Vec<u8>,
    owner: ArenaId,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<Vec<u8>>, owner: ArenaId) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            owner,
        }
    }

    pub fn owner(&self) -> ArenaId {
        self.owner
    }
}

/// A single piece of module-private, type-erased data adopted into an
/// entry's arena, c.f. `request_data_t` in the original. `persistable`
/// mirrors the original's per-datum `persist` flag: only persistable data
/// survives a round-trip through [`crate::handoff`].
pub struct SideDatum {
    pub key: String,
    pub persistable: bool,
    owner: ArenaId,
    value: Box<dyn Any + Send>,
}

impl std::fmt::Debug for SideDatum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SideDatum")
            .field("key", &self.key)
            .field("persistable", &self.persistable)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

impl SideDatum {
    pub fn new<T: Any + Send>(key: impl Into<String>, value: T, persistable: bool, owner: ArenaId) -> Self {
        Self {
            key: key.into(),
            persistable,
            owner,
            value: Box::new(value),
        }
    }

    pub fn owner(&self) -> ArenaId {
        self.owner
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut()
    }
}

/// A bag of [`SideDatum`]s belonging to one arena.
///
/// `Drop` releases data in reverse-insertion order, matching talloc's
/// reverse-parent-order destructor guarantee (invariant 2).
#[derive(Debug, Default)]
pub struct SideData {
    entries: Vec<SideDatum>,
}

impl SideData {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, datum: SideDatum) {
        self.entries.push(datum);
    }

    pub fn get(&self, key: &str) -> Option<&SideDatum> {
        self.entries.iter().find(|d| d.key == key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut SideDatum> {
        self.entries.iter_mut().find(|d| d.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SideDatum> {
        self.entries.iter()
    }

    /// Split out the persistable subset, leaving the rest attached to
    /// `self`. C.f. `request_data_by_persistance(&data, request, true)`.
    pub fn take_persistable(&mut self) -> SideData {
        let mut persistable = Vec::new();
        let mut rest = Vec::new();
        for datum in self.entries.drain(..) {
            if datum.persistable {
                persistable.push(datum);
            } else {
                rest.push(datum);
            }
        }
        self.entries = rest;
        SideData { entries: persistable }
    }
}

impl Drop for SideData {
    fn drop(&mut self) {
        while self.entries.pop().is_some() {}
    }
}
