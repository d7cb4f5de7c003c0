use serde::{Deserialize, Serialize};

/// A pending learning request raised when the soul could not answer alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerEscalation {
    /// Identifier of the pending learning record.
    pub learning_id: i64,

    /// Short summary of what the soul wants to ask.
    pub trigger_summary: String,

    /// The text that caused the escalation.
    #[serde(default)]
    pub question_context: String,
}

impl TrainerEscalation {
    /// Create a new trainer escalation.
    pub fn new(
        learning_id: i64,
        trigger_summary: impl Into<String>,
        question_context: impl Into<String>,
    ) -> Self {
        Self {
            learning_id,
            trigger_summary: trigger_summary.into(),
            question_context: question_context.into(),
        }
    }
}
