//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the conversation
//! and drives each turn through a [`TurnSource`], rendering snapshots as they
//! arrive.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::StreamExt;

use crate::chat::config::ChatConfig;
use crate::chat::render::{Renderer, render_progress};
use crate::error::Result;
use crate::session::Session;
use crate::turn::{TurnSource, TurnStream, validate_message};
use crate::types::{ResponseMode, SoulMessage};
use crate::{SoulClient, SoulReducer};

/// How often an in-flight turn checks for a user interrupt.
const INTERRUPT_POLL: Duration = Duration::from_millis(50);

/// Text recorded on a turn the user interrupted.
const INTERRUPTED: &str = "interrupted";

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// Turns attempted.
    pub turns: u64,
    /// Turns that settled without error.
    pub completed: u64,
    /// Turns that ended with an error or interrupt.
    pub failed: u64,
    /// Turns whose stream ended before every faculty answered.
    pub incomplete: u64,
    /// Turns escalated to the trainer.
    pub escalated: u64,
    /// Total input tokens reported by the backend.
    pub total_input_tokens: u64,
    /// Total output tokens reported by the backend.
    pub total_output_tokens: u64,
}

/// A chat session that owns the conversation and drives turns.
///
/// Only one turn is in flight at a time: [`ChatSession::send`] takes `&mut self`
/// and returns once the turn has ended.
pub struct ChatSession<S: TurnSource> {
    source: S,
    reducer: SoulReducer,
    session: Session,
    streaming: bool,
    stats: SessionStats,
}

impl ChatSession<SoulClient> {
    /// Creates a new chat session with the given client and configuration.
    pub fn new(client: SoulClient, config: &ChatConfig) -> Self {
        Self::with_source(client).with_streaming(config.streaming)
    }
}

impl<S: TurnSource> ChatSession<S> {
    /// Creates a new streaming chat session over any turn source.
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            reducer: SoulReducer::new(),
            session: Session::new(),
            streaming: true,
            stats: SessionStats::default(),
        }
    }

    /// Sets whether turns are streamed.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Uses `reducer` to fold future turns.
    pub fn with_reducer(mut self, reducer: SoulReducer) -> Self {
        self.reducer = reducer;
        self
    }

    /// The turn source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Switch between streaming and one-shot turns.
    pub fn set_streaming(&mut self, streaming: bool) {
        self.streaming = streaming;
    }

    /// True if turns are streamed.
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// The conversation so far.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            message_count: self.session.len(),
            ..self.stats.clone()
        }
    }

    /// Sends a user message and renders the soul's answer.
    ///
    /// This method:
    /// 1. Adds the user message and an empty soul message to the session
    /// 2. Opens a turn (streaming or one-shot)
    /// 3. Renders each new snapshot as it arrives
    /// 4. Leaves the final snapshot in the session
    ///
    /// Setting `interrupted` stops a streaming turn; the soul message is then
    /// marked failed with the text "interrupted".
    ///
    /// # Errors
    ///
    /// Returns an error if the message is empty, if the turn cannot be opened,
    /// or if the stream fails mid-turn.  In the latter two cases the soul
    /// message is still recorded, marked failed.
    pub async fn send(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
        interrupted: Arc<AtomicBool>,
    ) -> Result<SoulMessage> {
        validate_message(user_input)?;
        self.session.push_user(user_input);
        let initial = self.session.begin_soul();
        self.stats.turns += 1;

        let result = if self.streaming {
            self.send_streaming(user_input, initial, renderer, interrupted)
                .await
        } else {
            self.send_once(user_input, initial, renderer).await
        };
        if let Some(last) = self.session.last_soul() {
            let last = last.clone();
            self.record(&last);
        }
        result
    }

    async fn send_streaming(
        &mut self,
        user_input: &str,
        initial: SoulMessage,
        renderer: &mut dyn Renderer,
        interrupted: Arc<AtomicBool>,
    ) -> Result<SoulMessage> {
        let events = match self.source.open_turn(user_input).await {
            Ok(events) => events,
            Err(err) => {
                self.session
                    .update_soul(self.reducer.fail(&initial, err.to_string()));
                return Err(err);
            }
        };

        renderer.start_turn();
        let mut turn = TurnStream::new(events, self.reducer.clone(), initial.clone());
        let mut previous = initial;
        loop {
            if interrupted.swap(false, Ordering::Relaxed) {
                let state = turn.interrupt(INTERRUPTED).clone();
                renderer.print_interrupted();
                render_progress(renderer, &previous, &state);
                self.session.update_soul(state.clone());
                return Ok(state);
            }
            let item = tokio::select! {
                item = turn.next() => item,
                _ = tokio::time::sleep(INTERRUPT_POLL) => continue,
            };
            match item {
                Some(Ok(snapshot)) => {
                    render_progress(renderer, &previous, &snapshot);
                    self.session.update_soul(snapshot.clone());
                    previous = snapshot;
                }
                Some(Err(err)) => {
                    let state = turn.snapshot().clone();
                    render_progress(renderer, &previous, &state);
                    self.session.update_soul(state);
                    return Err(err);
                }
                None => return Ok(previous),
            }
        }
    }

    async fn send_once(
        &mut self,
        user_input: &str,
        initial: SoulMessage,
        renderer: &mut dyn Renderer,
    ) -> Result<SoulMessage> {
        match self.source.complete_turn(user_input).await {
            Ok(response) => {
                let settled = SoulMessage::from_response(initial.id.clone(), response);
                renderer.start_turn();
                render_progress(renderer, &initial, &settled);
                self.session.update_soul(settled.clone());
                Ok(settled)
            }
            Err(err) => {
                self.session
                    .update_soul(self.reducer.fail(&initial, err.to_string()));
                Err(err)
            }
        }
    }

    fn record(&mut self, message: &SoulMessage) {
        if message.is_failed() {
            self.stats.failed += 1;
        } else if message.is_incomplete() {
            self.stats.incomplete += 1;
        } else {
            self.stats.completed += 1;
        }
        if message.mode == Some(ResponseMode::NeedsTrainer) {
            self.stats.escalated += 1;
        }
        if let Some(usage) = &message.token_usage {
            self.stats.total_input_tokens += usage.input_tokens;
            self.stats.total_output_tokens += usage.output_tokens;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::render::PlainTextRenderer;
    use crate::turn::EventStream;
    use crate::types::{
        ChatMessage, ChatResponse, DoneEvent, FacultyStatus, HabitsOutput, IntellectOutput,
        MindOutput, NeedsTrainerEvent, StartEvent, StreamEvent, SynthesisOutput, TokenUsage,
    };
    use crate::Error;
    use async_trait::async_trait;
    use futures::stream;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct ScriptedSource {
        events: Mutex<Vec<Vec<Result<StreamEvent>>>>,
        pending_forever: bool,
        open_error: Option<Error>,
    }

    impl ScriptedSource {
        fn new(turns: Vec<Vec<Result<StreamEvent>>>) -> Self {
            Self {
                events: Mutex::new(turns),
                pending_forever: false,
                open_error: None,
            }
        }
    }

    #[async_trait]
    impl TurnSource for ScriptedSource {
        async fn open_turn(&self, _: &str) -> Result<EventStream> {
            if let Some(err) = &self.open_error {
                return Err(err.clone());
            }
            let events = self.events.lock().unwrap().remove(0);
            if self.pending_forever {
                Ok(Box::pin(stream::iter(events).chain(stream::pending())))
            } else {
                Ok(Box::pin(stream::iter(events)))
            }
        }

        async fn complete_turn(&self, _: &str) -> Result<ChatResponse> {
            Ok(ChatResponse {
                manas: MindOutput::new("warm", 0.8, 0.3),
                buddhi: IntellectOutput::new("logical", 0.6, vec![]),
                sanskaras: HabitsOutput::new("usual", 0.5, vec![]),
                synthesis: SynthesisOutput::new("Hi there", BTreeMap::new()),
                elapsed_ms: 1200,
                mode: None,
                trainer_needed: None,
            })
        }
    }

    fn renderer() -> PlainTextRenderer<Vec<u8>> {
        PlainTextRenderer::with_writer(Vec::new(), false)
    }

    fn flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[tokio::test]
    async fn streaming_turn_lands_in_session() {
        let source = ScriptedSource::new(vec![vec![
            Ok(StreamEvent::Start(StartEvent::default())),
            Ok(StreamEvent::Mind(MindOutput::new("warm", 0.8, 0.3))),
            Ok(StreamEvent::NeedsTrainer(NeedsTrainerEvent {
                learning_id: 5,
                trigger_summary: "What is grief?".to_string(),
                question_context: String::new(),
                elapsed_ms: Some(40),
            })),
            Ok(StreamEvent::Done(DoneEvent {
                elapsed_ms: Some(50),
                token_usage: Some(TokenUsage::new(12, 3)),
            })),
        ]]);
        let mut chat = ChatSession::with_source(source);
        let mut out = renderer();
        let message = chat.send("hello", &mut out, flag()).await.unwrap();

        assert_eq!(message.mode, Some(ResponseMode::NeedsTrainer));
        assert_eq!(chat.session().len(), 2);
        assert!(matches!(
            &chat.session().messages()[0],
            ChatMessage::User { text, .. } if text == "hello"
        ));
        assert_eq!(chat.session().last_soul(), Some(&message));
        let stats = chat.stats();
        assert_eq!(stats.turns, 1);
        assert_eq!(stats.incomplete, 1);
        assert_eq!(stats.escalated, 1);
        assert_eq!(stats.total_input_tokens, 12);

        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains("[Trainer Needed]  learning #5"));
    }

    #[tokio::test]
    async fn read_error_is_recorded_and_returned() {
        let source = ScriptedSource::new(vec![vec![
            Ok(StreamEvent::Mind(MindOutput::new("warm", 0.8, 0.3))),
            Err(Error::streaming("connection reset", None)),
        ]]);
        let mut chat = ChatSession::with_source(source);
        let err = chat.send("hello", &mut renderer(), flag()).await.unwrap_err();
        assert!(err.is_streaming());
        let soul = chat.session().last_soul().unwrap();
        assert_eq!(soul.mind_status, FacultyStatus::Done);
        assert_eq!(soul.intellect_status, FacultyStatus::Error);
        assert_eq!(chat.stats().failed, 1);
    }

    #[tokio::test]
    async fn open_error_marks_soul_failed() {
        let mut source = ScriptedSource::new(vec![]);
        source.open_error = Some(Error::internal_server("boom"));
        let mut chat = ChatSession::with_source(source);
        let err = chat.send("hello", &mut renderer(), flag()).await.unwrap_err();
        assert!(err.is_server_error());
        let soul = chat.session().last_soul().unwrap();
        assert_eq!(soul.statuses(), [FacultyStatus::Error; 4]);
        assert!(!soul.streaming);
    }

    #[tokio::test]
    async fn empty_input_starts_no_turn() {
        let mut chat = ChatSession::with_source(ScriptedSource::new(vec![]));
        let err = chat.send("   ", &mut renderer(), flag()).await.unwrap_err();
        assert!(err.is_validation());
        assert!(chat.session().is_empty());
        assert_eq!(chat.stats().turns, 0);
    }

    #[tokio::test]
    async fn interrupt_stops_a_stalled_turn() {
        let mut source = ScriptedSource::new(vec![vec![Ok(StreamEvent::Mind(MindOutput::new(
            "warm", 0.8, 0.3,
        )))]]);
        source.pending_forever = true;
        let mut chat = ChatSession::with_source(source);
        let interrupted = flag();
        let trigger = interrupted.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            trigger.store(true, Ordering::Relaxed);
        });
        let message = chat
            .send("hello", &mut renderer(), interrupted)
            .await
            .unwrap();
        assert_eq!(message.error.as_deref(), Some("interrupted"));
        assert_eq!(message.mind_status, FacultyStatus::Done);
        assert_eq!(message.habits_status, FacultyStatus::Error);
        assert_eq!(chat.stats().failed, 1);
    }

    #[tokio::test]
    async fn one_shot_turn() {
        let mut chat = ChatSession::with_source(ScriptedSource::new(vec![])).with_streaming(false);
        let message = chat.send("hello", &mut renderer(), flag()).await.unwrap();
        assert!(message.is_settled());
        assert_eq!(message.id, "msg-2");
        assert_eq!(chat.stats().completed, 1);
    }
}
