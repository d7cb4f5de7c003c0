use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default blending weight for the mind faculty.
pub const DEFAULT_MIND_WEIGHT: f64 = 0.35;

/// Default blending weight for the intellect faculty.
pub const DEFAULT_INTELLECT_WEIGHT: f64 = 0.40;

/// Default blending weight for the habits faculty.
pub const DEFAULT_HABITS_WEIGHT: f64 = 0.25;

/// One of the three faculties that answer every turn.
///
/// The backend names them `manas`, `buddhi` and `sanskaras`.  Those wire names
/// are what this type serializes to; the English names are accepted when
/// parsing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faculty {
    /// Emotional, intuitive response (manas).
    #[serde(rename = "manas", alias = "mind")]
    Mind,

    /// Analytical response with a reasoning chain (buddhi).
    #[serde(rename = "buddhi", alias = "intellect")]
    Intellect,

    /// Learned-pattern response driven by activated habits (sanskaras).
    #[serde(rename = "sanskaras", alias = "habits")]
    Habits,
}

impl Faculty {
    /// All faculties in display order.
    pub const ALL: [Faculty; 3] = [Faculty::Mind, Faculty::Intellect, Faculty::Habits];

    /// The backend's name for this faculty.
    pub fn wire_name(self) -> &'static str {
        match self {
            Faculty::Mind => "manas",
            Faculty::Intellect => "buddhi",
            Faculty::Habits => "sanskaras",
        }
    }

    /// A human-facing label, e.g. "Mind (Manas)".
    pub fn label(self) -> &'static str {
        match self {
            Faculty::Mind => "Mind (Manas)",
            Faculty::Intellect => "Intellect (Buddhi)",
            Faculty::Habits => "Habits (Sanskaras)",
        }
    }
}

impl fmt::Display for Faculty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// Error returned when parsing an unknown faculty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacultyParseError {
    /// The invalid string value that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for FacultyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown faculty: {}", self.invalid_value)
    }
}

impl std::error::Error for FacultyParseError {}

impl FromStr for Faculty {
    type Err = FacultyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manas" | "mind" => Ok(Faculty::Mind),
            "buddhi" | "intellect" => Ok(Faculty::Intellect),
            "sanskaras" | "habits" => Ok(Faculty::Habits),
            _ => Err(FacultyParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

/// Blending weights for the three faculties.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacultyWeights {
    /// Weight of the mind faculty.
    #[serde(rename = "manas")]
    pub mind: f64,

    /// Weight of the intellect faculty.
    #[serde(rename = "buddhi")]
    pub intellect: f64,

    /// Weight of the habits faculty.
    #[serde(rename = "sanskaras")]
    pub habits: f64,
}

impl FacultyWeights {
    /// Create a new set of weights.
    pub fn new(mind: f64, intellect: f64, habits: f64) -> Self {
        Self {
            mind,
            intellect,
            habits,
        }
    }

    /// The weight for a single faculty.
    pub fn get(&self, faculty: Faculty) -> f64 {
        match faculty {
            Faculty::Mind => self.mind,
            Faculty::Intellect => self.intellect,
            Faculty::Habits => self.habits,
        }
    }

    /// The weights keyed by wire name, the shape synthesis payloads use.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        Faculty::ALL
            .iter()
            .map(|faculty| (faculty.wire_name().to_string(), self.get(*faculty)))
            .collect()
    }
}

impl Default for FacultyWeights {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIND_WEIGHT,
            DEFAULT_INTELLECT_WEIGHT,
            DEFAULT_HABITS_WEIGHT,
        )
    }
}
