use serde::{Deserialize, Serialize};

use crate::types::FacultyWeights;

/// Default confidence threshold below which the soul asks its trainer.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.4;

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

/// The backend's runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Weight of the mind faculty.
    pub weight_manas: f64,

    /// Weight of the intellect faculty.
    pub weight_buddhi: f64,

    /// Weight of the habits faculty.
    pub weight_sanskaras: f64,

    /// Model the backend calls.
    pub claude_model: String,

    /// Sampling temperature.
    pub temperature: f64,

    /// Token limit per model call.
    pub max_tokens: u32,

    /// Whether low-confidence turns are escalated to the trainer.
    #[serde(default)]
    pub learning_mode_enabled: bool,

    /// Weighted confidence below which turns are escalated.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

impl ConfigSnapshot {
    /// The faculty weights in this configuration.
    pub fn weights(&self) -> FacultyWeights {
        FacultyWeights::new(self.weight_manas, self.weight_buddhi, self.weight_sanskaras)
    }
}

/// A partial configuration update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    /// New weight of the mind faculty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_manas: Option<f64>,

    /// New weight of the intellect faculty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_buddhi: Option<f64>,

    /// New weight of the habits faculty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_sanskaras: Option<f64>,

    /// New model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claude_model: Option<String>,

    /// New sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// New token limit per model call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Enable or disable learning mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_mode_enabled: Option<bool>,

    /// New escalation threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f64>,
}

impl ConfigUpdate {
    /// An empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all three faculty weights.
    pub fn with_weights(mut self, weights: FacultyWeights) -> Self {
        self.weight_manas = Some(weights.mind);
        self.weight_buddhi = Some(weights.intellect);
        self.weight_sanskaras = Some(weights.habits);
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.claude_model = Some(model.into());
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the token limit per model call.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Enable or disable learning mode.
    pub fn with_learning_mode(mut self, enabled: bool) -> Self {
        self.learning_mode_enabled = Some(enabled);
        self
    }

    /// Set the escalation threshold.
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = Some(threshold);
        self
    }
}
