// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod observability;
pub mod reducer;
pub mod session;
pub mod sse;
pub mod turn;
pub mod types;

// Re-exports
pub use client::{BASE_URL_ENV, DEFAULT_BASE_URL, SoulClient};
pub use client_logger::StreamLogger;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use reducer::{AWAITING_TRAINER_TEXT, Anomaly, SoulReducer, Transition};
pub use session::Session;
pub use sse::{FrameCodec, RawFrame, process_sse};
pub use turn::{EventStream, TurnSource, TurnStream, settle};
pub use types::*;
