//! Turns: one user message and the soul's evolving answer to it.
//!
//! [`TurnStream`] drives a [`SoulReducer`] over an event stream and yields the
//! resulting [`SoulMessage`] snapshots.  [`TurnSource`] is the seam between a
//! session and the backend that produces turns.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use async_trait::async_trait;
use futures::Stream;

use crate::observability::{
    TURN_ANOMALIES, TURN_COMPLETED, TURN_DURATION, TURN_FAILED, TURN_INCOMPLETE, TURN_STARTED,
};
use crate::{ChatResponse, Error, Result, SoulMessage, SoulReducer, StreamEvent, StreamLogger};

/// A boxed stream of decoded protocol events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Something that can answer a user message.
#[async_trait]
pub trait TurnSource: Send + Sync {
    /// Open a streaming turn for `message`.
    ///
    /// Errors returned here happen before any event was received.
    async fn open_turn(&self, message: &str) -> Result<EventStream>;

    /// Answer `message` in one shot.
    async fn complete_turn(&self, message: &str) -> Result<ChatResponse>;
}

/// A stream of snapshots of one turn.
///
/// Each decoded event is folded into the current snapshot and the result is
/// yielded.  When the event stream fails, every unsettled status is marked as
/// failed, the error is yielded, and the stream ends.  When the event stream
/// simply ends, the snapshot is marked as no longer streaming and yielded once
/// more if that changed it.
pub struct TurnStream {
    inner: EventStream,
    reducer: SoulReducer,
    state: SoulMessage,
    logger: Option<Arc<dyn StreamLogger>>,
    started: Instant,
    finished: bool,
}

impl TurnStream {
    /// Drive `reducer` over `events`, starting from `initial`.
    pub fn new<S>(events: S, reducer: SoulReducer, initial: SoulMessage) -> Self
    where
        S: Stream<Item = Result<StreamEvent>> + Send + 'static,
    {
        TURN_STARTED.click();
        tracing::debug!(id = %initial.id, "turn started");
        Self {
            inner: Box::pin(events),
            reducer,
            state: initial,
            logger: None,
            started: Instant::now(),
            finished: false,
        }
    }

    /// Pass every decoded event and the final snapshot to `logger`.
    pub fn with_logger(mut self, logger: Arc<dyn StreamLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> &SoulMessage {
        &self.state
    }

    /// Consume the stream, returning the latest snapshot.
    pub fn into_snapshot(self) -> SoulMessage {
        self.state
    }

    /// True once the stream has yielded its last item.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stop the turn early, marking every unsettled status as failed.
    ///
    /// The underlying event stream is dropped when this [`TurnStream`] is.
    pub fn interrupt(&mut self, reason: &str) -> &SoulMessage {
        if !self.finished {
            self.state = self.reducer.fail(&self.state, reason);
            self.finish();
        }
        &self.state
    }

    fn fold(&mut self, event: &StreamEvent) {
        if let Some(logger) = &self.logger {
            logger.log_stream_event(event);
        }
        let transition = self.reducer.apply(&self.state, event);
        if let Some(anomaly) = transition.anomaly {
            TURN_ANOMALIES.click();
            tracing::warn!(id = %self.state.id, event = %event.kind(), %anomaly, "ignoring out-of-protocol event");
        }
        self.state = transition.message;
    }

    fn finish(&mut self) {
        self.finished = true;
        TURN_DURATION.add(self.started.elapsed().as_secs_f64());
        if self.state.is_failed() {
            TURN_FAILED.click();
            tracing::info!(id = %self.state.id, error = ?self.state.error, "turn failed");
        } else if self.state.is_incomplete() {
            TURN_INCOMPLETE.click();
            tracing::info!(id = %self.state.id, statuses = ?self.state.statuses(), "turn ended incomplete");
        } else {
            TURN_COMPLETED.click();
            tracing::debug!(id = %self.state.id, elapsed_ms = ?self.state.elapsed_ms, "turn completed");
        }
        if let Some(logger) = &self.logger {
            logger.log_stream_message(&self.state);
        }
    }
}

impl Stream for TurnStream {
    type Item = Result<SoulMessage>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(event))) => {
                self.fold(&event);
                Poll::Ready(Some(Ok(self.state.clone())))
            }
            Poll::Ready(Some(Err(err))) => {
                self.state = self.reducer.fail(&self.state, err.to_string());
                self.finish();
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                let closed = self.reducer.close(&self.state);
                let changed = closed != self.state;
                self.state = closed;
                self.finish();
                if changed {
                    Poll::Ready(Some(Ok(self.state.clone())))
                } else {
                    Poll::Ready(None)
                }
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Drain `turn`, returning its final snapshot or the error that ended it.
pub async fn settle(mut turn: TurnStream) -> Result<SoulMessage> {
    use futures::StreamExt;

    while let Some(item) = turn.next().await {
        if let Err(err) = item {
            return Err(err);
        }
    }
    Ok(turn.into_snapshot())
}

/// Reject messages that carry no text.
pub(crate) fn validate_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(Error::validation(
            "message must not be empty",
            Some("message".to_string()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DoneEvent, EventKind, FacultyStatus, IntellectOutput, MindOutput, StartEvent,
        SynthesisEvent,
    };
    use futures::StreamExt;
    use futures::stream;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<EventKind>>,
        settled: Mutex<Vec<SoulMessage>>,
    }

    impl StreamLogger for RecordingLogger {
        fn log_response(&self, _: &ChatResponse) {}

        fn log_stream_event(&self, event: &StreamEvent) {
            self.events.lock().unwrap().push(event.kind());
        }

        fn log_stream_message(&self, message: &SoulMessage) {
            self.settled.lock().unwrap().push(message.clone());
        }
    }

    fn turn(events: Vec<Result<StreamEvent>>) -> TurnStream {
        TurnStream::new(
            stream::iter(events),
            SoulReducer::new(),
            SoulMessage::new("msg-1"),
        )
    }

    #[tokio::test]
    async fn one_snapshot_per_event() {
        let events = vec![
            Ok(StreamEvent::Start(StartEvent::default())),
            Ok(StreamEvent::Mind(MindOutput::new("warm", 0.8, 0.2))),
            Ok(StreamEvent::Synthesis(SynthesisEvent {
                response: "Hi there".to_string(),
                weights: Default::default(),
                mode: None,
                elapsed_ms: Some(10),
            })),
            Ok(StreamEvent::Done(DoneEvent::default())),
        ];
        let snapshots: Vec<SoulMessage> = turn(events)
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(snapshots.len(), 4);
        assert!(snapshots[0].opened);
        assert_eq!(snapshots[1].mind_status, FacultyStatus::Done);
        assert!(snapshots[2].streaming);
        assert!(!snapshots[3].streaming);
    }

    #[tokio::test]
    async fn error_fails_turn_and_ends() {
        let events = vec![
            Ok(StreamEvent::Mind(MindOutput::new("warm", 0.8, 0.2))),
            Err(Error::streaming("connection reset", None)),
            Ok(StreamEvent::Intellect(IntellectOutput::new("late", 0.5, vec![]))),
        ];
        let mut turn = turn(events);
        assert!(turn.next().await.unwrap().is_ok());
        let err = turn.next().await.unwrap().unwrap_err();
        assert!(err.is_streaming());
        assert!(turn.next().await.is_none());
        let state = turn.snapshot();
        assert_eq!(state.mind_status, FacultyStatus::Done);
        assert_eq!(state.intellect_status, FacultyStatus::Error);
        assert_eq!(state.synthesis_status, FacultyStatus::Error);
        assert!(state.is_failed());
        assert!(!state.streaming);
    }

    #[tokio::test]
    async fn natural_end_closes_turn() {
        let events = vec![Ok(StreamEvent::Mind(MindOutput::new("warm", 0.8, 0.2)))];
        let snapshots: Vec<Result<SoulMessage>> = turn(events).collect().await;
        assert_eq!(snapshots.len(), 2);
        let last = snapshots[1].as_ref().unwrap();
        assert!(!last.streaming);
        assert!(last.is_incomplete());
    }

    #[tokio::test]
    async fn done_turn_has_no_extra_snapshot() {
        let events = vec![Ok(StreamEvent::Done(DoneEvent::default()))];
        let snapshots: Vec<Result<SoulMessage>> = turn(events).collect().await;
        assert_eq!(snapshots.len(), 1);
    }

    #[tokio::test]
    async fn logger_sees_events_and_final_snapshot() {
        let logger = Arc::new(RecordingLogger::default());
        let events = vec![
            Ok(StreamEvent::Start(StartEvent::default())),
            Ok(StreamEvent::Mind(MindOutput::new("a", 0.1, 0.0))),
            Ok(StreamEvent::Mind(MindOutput::new("b", 0.1, 0.0))),
            Ok(StreamEvent::Done(DoneEvent::default())),
        ];
        let settled = settle(turn(events).with_logger(logger.clone()))
            .await
            .unwrap();
        assert_eq!(settled.mind.as_ref().unwrap().response, "a");
        assert_eq!(
            *logger.events.lock().unwrap(),
            vec![
                EventKind::Start,
                EventKind::Mind,
                EventKind::Mind,
                EventKind::Done
            ]
        );
        assert_eq!(*logger.settled.lock().unwrap(), vec![settled]);
    }

    #[tokio::test]
    async fn interrupt_marks_turn_failed() {
        let mut turn = turn(vec![Ok(StreamEvent::Start(StartEvent::default()))]);
        assert!(turn.next().await.is_some());
        let state = turn.interrupt("interrupted").clone();
        assert_eq!(state.error.as_deref(), Some("interrupted"));
        assert_eq!(state.statuses(), [FacultyStatus::Error; 4]);
        assert!(turn.next().await.is_none());
    }

    #[test]
    fn blank_messages_are_rejected() {
        assert!(validate_message("   \n").unwrap_err().is_validation());
        assert!(validate_message("hello").is_ok());
    }
}
