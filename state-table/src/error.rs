use thiserror::Error;

/// Errors surfaced by the state table, matching the kinds a caller needs to
/// distinguish (see the error table in the design document).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// `create` was attempted while the table already held `max_sessions` entries.
    #[error("state table is full ({max_sessions} sessions)")]
    TableFull {
        /// The configured bound that was hit.
        max_sessions: u32,
    },

    /// The derived or caller-supplied token collided with an existing entry.
    #[error("state token collided with an existing entry")]
    DuplicateToken,

    /// Entry-shell allocation failed.
    ///
    /// Also used in release builds in place of the internal-invariant assertions that
    /// are `debug_assert!`s in debug builds (see [`crate::entry::Entry`]).
    #[error("failed to allocate a state table entry")]
    AllocFail,
}

/// Convenience alias, matching the teacher crates' `type Result<T> = ...` convention.
pub type Result<T> = std::result::Result<T, Error>;
