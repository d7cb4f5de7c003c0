use serde::{Deserialize, Serialize};

/// A habit record as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Record identifier.
    pub id: i64,

    /// Short name.
    pub name: String,

    /// What the habit is about.
    #[serde(default)]
    pub description: String,

    /// Grouping, e.g. "emotional" or "social".
    pub category: String,

    /// Comma-separated trigger keywords.
    #[serde(default)]
    pub keywords: String,

    /// Weight before reinforcement.
    pub base_weight: f64,

    /// How many times the habit has been reinforced.
    #[serde(default)]
    pub repetition_count: u32,

    /// Weight after reinforcement.
    pub effective_weight: f64,

    /// Emotional valence in [-1, 1].
    #[serde(default)]
    pub valence: f64,
}
