use serde::{Deserialize, Serialize};
use std::fmt;

/// How a turn was answered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// The soul synthesized an answer on its own.
    Autonomous,

    /// The soul escalated to its trainer instead of synthesizing.
    NeedsTrainer,
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseMode::Autonomous => write!(f, "autonomous"),
            ResponseMode::NeedsTrainer => write!(f, "needs_trainer"),
        }
    }
}
