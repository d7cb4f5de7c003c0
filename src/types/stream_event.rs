use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{
    Faculty, HabitsOutput, IntellectOutput, MindOutput, ResponseMode, SynthesisOutput,
    TokenUsage, TrainerEscalation,
};
use crate::{Error, Result};

/// The name of a protocol event, as carried on the `event:` line of a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The backend accepted the turn.
    Start,
    /// The mind faculty answered (`manas`).
    Mind,
    /// The intellect faculty answered (`buddhi`).
    Intellect,
    /// The habits faculty answered (`sanskaras`).
    Habits,
    /// Weighted confidence was computed; synthesis is under way.
    Confidence,
    /// The synthesized answer.
    Synthesis,
    /// The turn was escalated to the trainer.
    NeedsTrainer,
    /// The turn finished successfully.
    Done,
    /// The turn failed.
    Error,
}

impl EventKind {
    /// The backend's name for this event.
    pub fn wire_name(self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Mind => "manas",
            EventKind::Intellect => "buddhi",
            EventKind::Habits => "sanskaras",
            EventKind::Confidence => "confidence",
            EventKind::Synthesis => "synthesis",
            EventKind::NeedsTrainer => "needs_trainer",
            EventKind::Done => "done",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "start" => Ok(EventKind::Start),
            "manas" | "mind" => Ok(EventKind::Mind),
            "buddhi" | "intellect" => Ok(EventKind::Intellect),
            "sanskaras" | "habits" => Ok(EventKind::Habits),
            "confidence" => Ok(EventKind::Confidence),
            "synthesis" => Ok(EventKind::Synthesis),
            "needs_trainer" => Ok(EventKind::NeedsTrainer),
            "done" => Ok(EventKind::Done),
            "error" => Ok(EventKind::Error),
            _ => Err(Error::serialization(
                format!("Unknown stream event type: {s}"),
                None,
            )),
        }
    }
}

/// Payload of `start`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartEvent {
    /// Echo of the user's message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Backend wall-clock time the turn began, in seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// Payload of `confidence`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceEvent {
    /// Weighted confidence across the three faculties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted: Option<f64>,

    /// Threshold below which the soul escalates to its trainer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Whether learning mode was enabled for this turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_mode: Option<bool>,
}

/// Payload of `synthesis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisEvent {
    /// The synthesized answer text.
    pub response: String,

    /// Blending weight per faculty.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,

    /// Mode reported by the backend; always autonomous in practice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ResponseMode>,

    /// Milliseconds from turn start to synthesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl SynthesisEvent {
    /// The synthesis output carried by this event.
    pub fn output(&self) -> SynthesisOutput {
        SynthesisOutput::new(self.response.clone(), self.weights.clone())
    }
}

/// Payload of `needs_trainer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedsTrainerEvent {
    /// Identifier of the pending learning record.
    pub learning_id: i64,

    /// Short summary of what the soul wants to ask.
    pub trigger_summary: String,

    /// The text that caused the escalation.
    #[serde(default)]
    pub question_context: String,

    /// Milliseconds from turn start to escalation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl NeedsTrainerEvent {
    /// The escalation carried by this event.
    pub fn escalation(&self) -> TrainerEscalation {
        TrainerEscalation::new(
            self.learning_id,
            self.trigger_summary.clone(),
            self.question_context.clone(),
        )
    }
}

/// Payload of `done`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoneEvent {
    /// Milliseconds from turn start to completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,

    /// Token accounting for the whole turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

/// Payload of `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// What went wrong.
    #[serde(default)]
    pub error: String,

    /// The faculty module that failed, when the failure is specific to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl ErrorEvent {
    /// The failed faculty, if the payload names a known one.
    pub fn faculty(&self) -> Option<Faculty> {
        self.module.as_deref().and_then(|m| m.parse().ok())
    }
}

/// One decoded protocol event.
///
/// The event name selects the payload type and the payload is validated when
/// the frame is decoded, so consumers never see a loosely-typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The backend accepted the turn.
    Start(StartEvent),
    /// The mind faculty answered.
    Mind(MindOutput),
    /// The intellect faculty answered.
    Intellect(IntellectOutput),
    /// The habits faculty answered.
    Habits(HabitsOutput),
    /// Synthesis has begun.
    Confidence(ConfidenceEvent),
    /// The synthesized answer.
    Synthesis(SynthesisEvent),
    /// The turn was escalated to the trainer.
    NeedsTrainer(NeedsTrainerEvent),
    /// The turn finished successfully.
    Done(DoneEvent),
    /// The turn failed.
    Error(ErrorEvent),
}

impl StreamEvent {
    /// Decode the JSON payload of a frame whose event name is `kind`.
    pub fn decode(kind: EventKind, data: &str) -> Result<Self> {
        Ok(match kind {
            EventKind::Start => StreamEvent::Start(parse(kind, data)?),
            EventKind::Mind => StreamEvent::Mind(parse(kind, data)?),
            EventKind::Intellect => StreamEvent::Intellect(parse(kind, data)?),
            EventKind::Habits => StreamEvent::Habits(parse(kind, data)?),
            EventKind::Confidence => StreamEvent::Confidence(parse(kind, data)?),
            EventKind::Synthesis => StreamEvent::Synthesis(parse(kind, data)?),
            EventKind::NeedsTrainer => StreamEvent::NeedsTrainer(parse(kind, data)?),
            EventKind::Done => StreamEvent::Done(parse(kind, data)?),
            EventKind::Error => StreamEvent::Error(parse(kind, data)?),
        })
    }

    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            StreamEvent::Start(_) => EventKind::Start,
            StreamEvent::Mind(_) => EventKind::Mind,
            StreamEvent::Intellect(_) => EventKind::Intellect,
            StreamEvent::Habits(_) => EventKind::Habits,
            StreamEvent::Confidence(_) => EventKind::Confidence,
            StreamEvent::Synthesis(_) => EventKind::Synthesis,
            StreamEvent::NeedsTrainer(_) => EventKind::NeedsTrainer,
            StreamEvent::Done(_) => EventKind::Done,
            StreamEvent::Error(_) => EventKind::Error,
        }
    }

    /// True for `done` and `error`, the events that end a turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done(_) | StreamEvent::Error(_))
    }
}

fn parse<T: DeserializeOwned>(kind: EventKind, data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| {
        Error::serialization(
            format!("Failed to parse {kind} payload: {e}"),
            Some(Box::new(e)),
        )
    })
}
