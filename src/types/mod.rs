// Public modules
pub mod chat_message;
pub mod chat_response;
pub mod config_snapshot;
pub mod faculty;
pub mod faculty_output;
pub mod faculty_status;
pub mod habit;
pub mod health;
pub mod learning;
pub mod response_mode;
pub mod stream_event;
pub mod synthesis_output;
pub mod token_usage;
pub mod trainer_escalation;

// Re-exports
pub use chat_message::{ChatMessage, SoulMessage};
pub use chat_response::{ChatRequest, ChatResponse};
pub use config_snapshot::{ConfigSnapshot, ConfigUpdate, DEFAULT_CONFIDENCE_THRESHOLD};
pub use faculty::{
    DEFAULT_HABITS_WEIGHT, DEFAULT_INTELLECT_WEIGHT, DEFAULT_MIND_WEIGHT, Faculty,
    FacultyParseError, FacultyWeights,
};
pub use faculty_output::{ActivatedHabit, FacultyOutput, HabitsOutput, IntellectOutput, MindOutput};
pub use faculty_status::FacultyStatus;
pub use habit::Habit;
pub use health::Health;
pub use learning::{GuidanceRequest, Learning, LearningCreate, LearningStatus};
pub use response_mode::ResponseMode;
pub use stream_event::{
    ConfidenceEvent, DoneEvent, ErrorEvent, EventKind, NeedsTrainerEvent, StartEvent,
    StreamEvent, SynthesisEvent,
};
pub use synthesis_output::SynthesisOutput;
pub use token_usage::TokenUsage;
pub use trainer_escalation::TrainerEscalation;
