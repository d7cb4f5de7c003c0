use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The unifying answer that blends the three faculties.
///
/// Weights are informational; they need not sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOutput {
    /// The synthesized answer text.
    pub response: String,

    /// Blending weight per faculty, keyed by faculty name.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

impl SynthesisOutput {
    /// Create a new synthesis output.
    pub fn new(response: impl Into<String>, weights: BTreeMap<String, f64>) -> Self {
        Self {
            response: response.into(),
            weights,
        }
    }
}
