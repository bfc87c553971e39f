/// The policy interpreter's return code: a closed sum type over the ten
/// values the interpreter may hand back, so the transition tables in
/// [`crate::machine`] can match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    Updated,
    Noop,
    NotFound,
    Reject,
    Fail,
    Invalid,
    Userlock,
    Handled,
    Yield,
}

impl Verdict {
    /// `RECV`'s "soft" bucket: proceed to `Auth-Type` selection.
    pub fn is_soft(self) -> bool {
        matches!(self, Verdict::Noop | Verdict::NotFound | Verdict::Ok | Verdict::Updated)
    }
}
