use serde::{Deserialize, Serialize};

use crate::types::{
    ChatResponse, Faculty, FacultyOutput, FacultyStatus, HabitsOutput, IntellectOutput,
    MindOutput, ResponseMode, SynthesisOutput, TokenUsage, TrainerEscalation,
};

/// The evolving state of the soul's answer to one turn.
///
/// Values of this type are snapshots: the reducer never mutates a snapshot it
/// has handed out, it builds the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoulMessage {
    /// Identifier of the message within its session.
    pub id: String,

    /// Output of the mind faculty, once it arrives.
    pub mind: Option<MindOutput>,

    /// Output of the intellect faculty, once it arrives.
    pub intellect: Option<IntellectOutput>,

    /// Output of the habits faculty, once it arrives.
    pub habits: Option<HabitsOutput>,

    /// The synthesized answer, or the placeholder shown while awaiting the trainer.
    pub synthesis: Option<SynthesisOutput>,

    /// The trainer escalation, if the turn was escalated.
    pub trainer: Option<TrainerEscalation>,

    /// How the turn was answered.
    pub mode: Option<ResponseMode>,

    /// Milliseconds the backend spent on the turn.
    pub elapsed_ms: Option<u64>,

    /// Token accounting reported when the turn finished.
    pub token_usage: Option<TokenUsage>,

    /// True once the backend acknowledged the turn.
    pub opened: bool,

    /// True until the turn ends, successfully or not.
    pub streaming: bool,

    /// Error text for a failed turn.
    pub error: Option<String>,

    /// Progress of the mind faculty.
    pub mind_status: FacultyStatus,

    /// Progress of the intellect faculty.
    pub intellect_status: FacultyStatus,

    /// Progress of the habits faculty.
    pub habits_status: FacultyStatus,

    /// Progress of the synthesis.
    pub synthesis_status: FacultyStatus,
}

impl SoulMessage {
    /// A fresh, streaming soul message with every status waiting.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mind: None,
            intellect: None,
            habits: None,
            synthesis: None,
            trainer: None,
            mode: None,
            elapsed_ms: None,
            token_usage: None,
            opened: false,
            streaming: true,
            error: None,
            mind_status: FacultyStatus::Waiting,
            intellect_status: FacultyStatus::Waiting,
            habits_status: FacultyStatus::Waiting,
            synthesis_status: FacultyStatus::Waiting,
        }
    }

    /// The settled message equivalent to a one-shot chat response.
    pub fn from_response(id: impl Into<String>, response: ChatResponse) -> Self {
        let mode = response.mode.unwrap_or(if response.trainer_needed.is_some() {
            ResponseMode::NeedsTrainer
        } else {
            ResponseMode::Autonomous
        });
        Self {
            mind: Some(response.manas),
            intellect: Some(response.buddhi),
            habits: Some(response.sanskaras),
            synthesis: Some(response.synthesis),
            trainer: response.trainer_needed,
            mode: Some(mode),
            elapsed_ms: Some(response.elapsed_ms),
            opened: true,
            streaming: false,
            mind_status: FacultyStatus::Done,
            intellect_status: FacultyStatus::Done,
            habits_status: FacultyStatus::Done,
            synthesis_status: FacultyStatus::Done,
            ..Self::new(id)
        }
    }

    /// The status of one faculty.
    pub fn status(&self, faculty: Faculty) -> FacultyStatus {
        match faculty {
            Faculty::Mind => self.mind_status,
            Faculty::Intellect => self.intellect_status,
            Faculty::Habits => self.habits_status,
        }
    }

    pub(crate) fn status_mut(&mut self, faculty: Faculty) -> &mut FacultyStatus {
        match faculty {
            Faculty::Mind => &mut self.mind_status,
            Faculty::Intellect => &mut self.intellect_status,
            Faculty::Habits => &mut self.habits_status,
        }
    }

    /// A copy of one faculty's output, if it has arrived.
    pub fn faculty_output(&self, faculty: Faculty) -> Option<FacultyOutput> {
        match faculty {
            Faculty::Mind => self.mind.clone().map(FacultyOutput::Mind),
            Faculty::Intellect => self.intellect.clone().map(FacultyOutput::Intellect),
            Faculty::Habits => self.habits.clone().map(FacultyOutput::Habits),
        }
    }

    /// All four statuses: mind, intellect, habits, synthesis.
    pub fn statuses(&self) -> [FacultyStatus; 4] {
        [
            self.mind_status,
            self.intellect_status,
            self.habits_status,
            self.synthesis_status,
        ]
    }

    /// True once the turn ended and every status is terminal.
    pub fn is_settled(&self) -> bool {
        !self.streaming && self.statuses().iter().all(|s| s.is_terminal())
    }

    /// True if the turn ended while some faculty or the synthesis never finished.
    pub fn is_incomplete(&self) -> bool {
        !self.streaming && self.statuses().iter().any(|s| !s.is_terminal())
    }

    /// True if the turn ended with an error.
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// One entry in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ChatMessage {
    /// Something the user said.
    User {
        /// Identifier of the message within its session.
        id: String,
        /// The text the user sent.
        text: String,
    },

    /// The soul's answer to the preceding user message.
    Soul(SoulMessage),
}

impl ChatMessage {
    /// Identifier of the message within its session.
    pub fn id(&self) -> &str {
        match self {
            ChatMessage::User { id, .. } => id,
            ChatMessage::Soul(soul) => &soul.id,
        }
    }

    /// The soul state, if this is a soul message.
    pub fn as_soul(&self) -> Option<&SoulMessage> {
        match self {
            ChatMessage::User { .. } => None,
            ChatMessage::Soul(soul) => Some(soul),
        }
    }
}
