use serde::{Deserialize, Serialize};
use std::fmt;

/// Default confidence boost granted by trainer guidance.
pub const DEFAULT_CONFIDENCE_BOOST: f64 = 0.7;

/// Default set of faculties a learning informs.
pub const DEFAULT_MODULES_INFORMED: &str = "all";

fn default_modules_informed() -> String {
    DEFAULT_MODULES_INFORMED.to_string()
}

fn default_confidence_boost() -> f64 {
    DEFAULT_CONFIDENCE_BOOST
}

/// Lifecycle of a learning record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningStatus {
    /// Awaiting trainer guidance.
    Pending,
    /// Guidance given and in use.
    Active,
    /// Retired by the trainer.
    Superseded,
}

impl fmt::Display for LearningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearningStatus::Pending => write!(f, "pending"),
            LearningStatus::Active => write!(f, "active"),
            LearningStatus::Superseded => write!(f, "superseded"),
        }
    }
}

/// A learning record: a question the soul asked and what its trainer taught it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Learning {
    /// Record identifier.
    pub id: i64,

    /// Short summary of the question.
    pub trigger_summary: String,

    /// The text that raised the question.
    #[serde(default)]
    pub question_context: String,

    /// The trainer's guidance; empty while pending.
    #[serde(default)]
    pub guidance: String,

    /// How the soul should apply the guidance.
    #[serde(default)]
    pub application_note: String,

    /// Which faculties the guidance informs.
    #[serde(default = "default_modules_informed")]
    pub modules_informed: String,

    /// Comma-separated trigger keywords.
    #[serde(default)]
    pub keywords: String,

    /// Confidence boost applied when the learning matches.
    #[serde(default = "default_confidence_boost")]
    pub confidence_boost: f64,

    /// How many turns have used this learning.
    #[serde(default)]
    pub times_applied: u32,

    /// Lifecycle status.
    pub status: LearningStatus,
}

/// Trainer guidance for a pending learning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidanceRequest {
    /// The guidance itself.
    pub guidance: String,

    /// How the soul should apply it.
    pub application_note: String,

    /// Which faculties the guidance informs.
    pub modules_informed: String,

    /// Confidence boost applied when the learning matches.
    pub confidence_boost: f64,
}

impl GuidanceRequest {
    /// Guidance informing all faculties with the default boost.
    pub fn new(guidance: impl Into<String>, application_note: impl Into<String>) -> Self {
        Self {
            guidance: guidance.into(),
            application_note: application_note.into(),
            modules_informed: default_modules_informed(),
            confidence_boost: DEFAULT_CONFIDENCE_BOOST,
        }
    }

    /// Restrict the faculties the guidance informs.
    pub fn with_modules_informed(mut self, modules: impl Into<String>) -> Self {
        self.modules_informed = modules.into();
        self
    }

    /// Set the confidence boost.
    pub fn with_confidence_boost(mut self, boost: f64) -> Self {
        self.confidence_boost = boost;
        self
    }
}

/// A learning the trainer teaches proactively, without a pending question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningCreate {
    /// Short summary of the situation the learning covers.
    pub trigger_summary: String,

    /// Example text for the situation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_context: Option<String>,

    /// Comma-separated trigger keywords.
    pub keywords: String,

    /// The guidance itself.
    pub guidance: String,

    /// How the soul should apply it.
    pub application_note: String,

    /// Which faculties the guidance informs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules_informed: Option<String>,

    /// Confidence boost applied when the learning matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_boost: Option<f64>,
}

impl LearningCreate {
    /// Create a new learning with the required fields.
    pub fn new(
        trigger_summary: impl Into<String>,
        keywords: impl Into<String>,
        guidance: impl Into<String>,
        application_note: impl Into<String>,
    ) -> Self {
        Self {
            trigger_summary: trigger_summary.into(),
            question_context: None,
            keywords: keywords.into(),
            guidance: guidance.into(),
            application_note: application_note.into(),
            modules_informed: None,
            confidence_boost: None,
        }
    }

    /// Set the example text.
    pub fn with_question_context(mut self, context: impl Into<String>) -> Self {
        self.question_context = Some(context.into());
        self
    }
}
