//! Logging hook for soul client turns.
//!
//! The [`StreamLogger`] trait lets callers capture every event a turn receives
//! and the message each turn settles into, e.g. to keep a transcript.

use crate::{ChatResponse, SoulMessage, StreamEvent};

/// A trait for recording what a [`SoulClient`](crate::SoulClient) receives.
///
/// # Example
///
/// ```rust,ignore
/// use soulai::{ChatResponse, SoulMessage, StreamEvent, StreamLogger};
/// use std::sync::Mutex;
///
/// struct Transcript {
///     lines: Mutex<Vec<String>>,
/// }
///
/// impl StreamLogger for Transcript {
///     fn log_response(&self, response: &ChatResponse) {
///         self.lines.lock().unwrap().push(format!("response: {}", response.synthesis.response));
///     }
///
///     fn log_stream_event(&self, event: &StreamEvent) {
///         self.lines.lock().unwrap().push(format!("event: {}", event.kind()));
///     }
///
///     fn log_stream_message(&self, message: &SoulMessage) {
///         self.lines.lock().unwrap().push(format!("settled: {message:?}"));
///     }
/// }
/// ```
pub trait StreamLogger: Send + Sync {
    /// Log the response to a one-shot `chat` call.
    fn log_response(&self, response: &ChatResponse);

    /// Log one decoded event of a streaming turn.
    ///
    /// Called before the event is folded, including for events the reducer
    /// goes on to ignore.
    fn log_stream_event(&self, event: &StreamEvent);

    /// Log the final snapshot of a streaming turn, once the stream has ended.
    fn log_stream_message(&self, message: &SoulMessage);
}
