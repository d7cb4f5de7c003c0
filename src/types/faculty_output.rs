use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::Faculty;

/// A habit the habits faculty drew on while answering.
///
/// Habit descriptors come from model output and are loosely shaped, so a
/// missing or null `name` or `weight` decodes to the empty string or zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivatedHabit {
    /// Name of the habit.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// How strongly the habit was weighted for this turn.
    #[serde(default, deserialize_with = "null_as_default")]
    pub weight: f64,

    /// How the habit shaped the answer, when the backend says.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influence: Option<String>,
}

impl ActivatedHabit {
    /// Create a new activated habit without an influence tag.
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            influence: None,
        }
    }

    /// Set the influence tag.
    pub fn with_influence(mut self, influence: impl Into<String>) -> Self {
        self.influence = Some(influence.into());
        self
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Output of the mind faculty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindOutput {
    /// The faculty's answer text.
    pub response: String,

    /// Confidence in [0, 1].
    #[serde(default)]
    pub confidence: f64,

    /// Emotional valence in [-1, 1].
    #[serde(default)]
    pub valence: f64,

    /// Backend-specific extras.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl MindOutput {
    /// Create a new mind output.
    pub fn new(response: impl Into<String>, confidence: f64, valence: f64) -> Self {
        Self {
            response: response.into(),
            confidence,
            valence,
            metadata: Map::new(),
        }
    }
}

/// Output of the intellect faculty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntellectOutput {
    /// The faculty's answer text.
    pub response: String,

    /// Confidence in [0, 1].
    #[serde(default)]
    pub confidence: f64,

    /// Ordered reasoning steps.
    #[serde(default)]
    pub reasoning_chain: Vec<String>,

    /// Backend-specific extras.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl IntellectOutput {
    /// Create a new intellect output.
    pub fn new(response: impl Into<String>, confidence: f64, reasoning_chain: Vec<String>) -> Self {
        Self {
            response: response.into(),
            confidence,
            reasoning_chain,
            metadata: Map::new(),
        }
    }
}

/// Output of the habits faculty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitsOutput {
    /// The faculty's answer text.
    pub response: String,

    /// Confidence in [0, 1].
    #[serde(default)]
    pub confidence: f64,

    /// Habits that were activated for this turn.
    #[serde(default)]
    pub activated_habits: Vec<ActivatedHabit>,

    /// Backend-specific extras.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl HabitsOutput {
    /// Create a new habits output.
    pub fn new(
        response: impl Into<String>,
        confidence: f64,
        activated_habits: Vec<ActivatedHabit>,
    ) -> Self {
        Self {
            response: response.into(),
            confidence,
            activated_habits,
            metadata: Map::new(),
        }
    }
}

/// Any one faculty's output, tagged by faculty.
#[derive(Debug, Clone, PartialEq)]
pub enum FacultyOutput {
    /// Output of the mind faculty.
    Mind(MindOutput),
    /// Output of the intellect faculty.
    Intellect(IntellectOutput),
    /// Output of the habits faculty.
    Habits(HabitsOutput),
}

impl FacultyOutput {
    /// Which faculty produced this output.
    pub fn faculty(&self) -> Faculty {
        match self {
            FacultyOutput::Mind(_) => Faculty::Mind,
            FacultyOutput::Intellect(_) => Faculty::Intellect,
            FacultyOutput::Habits(_) => Faculty::Habits,
        }
    }

    /// The answer text.
    pub fn response(&self) -> &str {
        match self {
            FacultyOutput::Mind(output) => &output.response,
            FacultyOutput::Intellect(output) => &output.response,
            FacultyOutput::Habits(output) => &output.response,
        }
    }

    /// The confidence score.
    pub fn confidence(&self) -> f64 {
        match self {
            FacultyOutput::Mind(output) => output.confidence,
            FacultyOutput::Intellect(output) => output.confidence,
            FacultyOutput::Habits(output) => output.confidence,
        }
    }
}
