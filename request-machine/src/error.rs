use thiserror::Error;

/// Errors surfaced by the request state machine, matching §7's table.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    StateTable(#[from] state_table::Error),

    #[error("no policy section configured for `{name1} {name2}`")]
    SectionMissing { name1: String, name2: String },

    #[error("packet decode failed")]
    DecodeFail,
}
