use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress of one faculty, or of the synthesis, within a turn.
///
/// Statuses only move forward: `Waiting -> Loading -> Done`, with `Error`
/// reachable from either non-terminal state.  `Done` and `Error` are terminal.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacultyStatus {
    /// Nothing heard yet.
    #[default]
    Waiting,

    /// Computation is known to be under way.
    Loading,

    /// The payload arrived.
    Done,

    /// The faculty failed or the transport failed before it answered.
    Error,
}

impl FacultyStatus {
    /// True for `Done` and `Error`.
    pub fn is_terminal(self) -> bool {
        matches!(self, FacultyStatus::Done | FacultyStatus::Error)
    }

    /// True if moving from `self` to `next` is a legal transition.
    pub fn can_advance_to(self, next: FacultyStatus) -> bool {
        match (self, next) {
            (FacultyStatus::Waiting, FacultyStatus::Loading) => true,
            (FacultyStatus::Loading, FacultyStatus::Loading) => true,
            (FacultyStatus::Waiting | FacultyStatus::Loading, FacultyStatus::Done) => true,
            (FacultyStatus::Waiting | FacultyStatus::Loading, FacultyStatus::Error) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FacultyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacultyStatus::Waiting => write!(f, "waiting"),
            FacultyStatus::Loading => write!(f, "loading"),
            FacultyStatus::Done => write!(f, "done"),
            FacultyStatus::Error => write!(f, "error"),
        }
    }
}
