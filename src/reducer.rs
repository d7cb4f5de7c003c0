//! The session reducer: folds protocol events into soul message snapshots.
//!
//! [`SoulReducer::apply`] is a pure function of its inputs.  It never mutates
//! the snapshot it is given and never fails; events that violate the turn
//! protocol leave the state unchanged and are reported as an [`Anomaly`].

use std::fmt;

use crate::types::{
    DoneEvent, ErrorEvent, Faculty, FacultyStatus, FacultyWeights, NeedsTrainerEvent,
    ResponseMode, SoulMessage, StreamEvent, SynthesisEvent, SynthesisOutput,
};

/// Text shown in place of a synthesis while the soul awaits its trainer.
pub const AWAITING_TRAINER_TEXT: &str = "I need guidance from my trainer for this.";

/// A protocol violation noticed while folding an event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Anomaly {
    /// A faculty answered after its status was already terminal.
    DuplicateFaculty(Faculty),
    /// A synthesis or escalation arrived after the synthesis had settled.
    SynthesisAlreadySettled,
    /// A synthesis arrived after the turn was escalated to the trainer.
    TrainerAlreadyEscalated,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::DuplicateFaculty(faculty) => {
                write!(f, "duplicate {} output ignored", faculty.wire_name())
            }
            Anomaly::SynthesisAlreadySettled => write!(f, "synthesis already settled"),
            Anomaly::TrainerAlreadyEscalated => {
                write!(f, "synthesis ignored after trainer escalation")
            }
        }
    }
}

/// The result of folding one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// The next snapshot.
    pub message: SoulMessage,
    /// Set when the event was ignored as a protocol violation.
    pub anomaly: Option<Anomaly>,
}

impl Transition {
    fn changed(message: SoulMessage) -> Self {
        Self {
            message,
            anomaly: None,
        }
    }

    fn ignored(message: &SoulMessage, anomaly: Anomaly) -> Self {
        Self {
            message: message.clone(),
            anomaly: Some(anomaly),
        }
    }
}

/// Folds stream events into [`SoulMessage`] snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct SoulReducer {
    default_weights: FacultyWeights,
    awaiting_trainer_text: String,
}

impl Default for SoulReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl SoulReducer {
    /// A reducer using the backend's default weights for trainer placeholders.
    pub fn new() -> Self {
        Self {
            default_weights: FacultyWeights::default(),
            awaiting_trainer_text: AWAITING_TRAINER_TEXT.to_string(),
        }
    }

    /// Use `weights` for the placeholder synthesis of an escalated turn.
    pub fn with_weights(mut self, weights: FacultyWeights) -> Self {
        self.default_weights = weights;
        self
    }

    /// Use `text` for the placeholder synthesis of an escalated turn.
    pub fn with_awaiting_trainer_text(mut self, text: impl Into<String>) -> Self {
        self.awaiting_trainer_text = text.into();
        self
    }

    /// The weights attached to placeholder syntheses.
    pub fn default_weights(&self) -> FacultyWeights {
        self.default_weights
    }

    /// Fold one event into `state`.
    pub fn apply(&self, state: &SoulMessage, event: &StreamEvent) -> Transition {
        match event {
            StreamEvent::Start(_) => {
                let mut next = state.clone();
                next.opened = true;
                Transition::changed(next)
            }
            StreamEvent::Mind(output) => self.attach(state, Faculty::Mind, |next| {
                next.mind = Some(output.clone());
            }),
            StreamEvent::Intellect(output) => self.attach(state, Faculty::Intellect, |next| {
                next.intellect = Some(output.clone());
            }),
            StreamEvent::Habits(output) => self.attach(state, Faculty::Habits, |next| {
                next.habits = Some(output.clone());
            }),
            StreamEvent::Confidence(_) => {
                let mut next = state.clone();
                if next.synthesis_status.can_advance_to(FacultyStatus::Loading) {
                    next.synthesis_status = FacultyStatus::Loading;
                }
                Transition::changed(next)
            }
            StreamEvent::Synthesis(synthesis) => self.synthesize(state, synthesis),
            StreamEvent::NeedsTrainer(needs) => self.escalate(state, needs),
            StreamEvent::Done(done) => self.finish(state, done),
            StreamEvent::Error(error) => self.error(state, error),
        }
    }

    /// Mark the turn failed by a transport fault.
    ///
    /// Every status that has not settled becomes `Error`.
    pub fn fail(&self, state: &SoulMessage, text: impl Into<String>) -> SoulMessage {
        let mut next = state.clone();
        for faculty in Faculty::ALL {
            let status = next.status_mut(faculty);
            if !status.is_terminal() {
                *status = FacultyStatus::Error;
            }
        }
        if !next.synthesis_status.is_terminal() {
            next.synthesis_status = FacultyStatus::Error;
        }
        next.error = Some(text.into());
        next.streaming = false;
        next
    }

    /// Mark the turn ended without `done` or `error`.
    ///
    /// Statuses are left as they are, so an unfinished turn stays visibly
    /// incomplete.
    pub fn close(&self, state: &SoulMessage) -> SoulMessage {
        let mut next = state.clone();
        next.streaming = false;
        next
    }

    fn attach(
        &self,
        state: &SoulMessage,
        faculty: Faculty,
        set: impl FnOnce(&mut SoulMessage),
    ) -> Transition {
        if state.status(faculty).is_terminal() {
            return Transition::ignored(state, Anomaly::DuplicateFaculty(faculty));
        }
        let mut next = state.clone();
        set(&mut next);
        *next.status_mut(faculty) = FacultyStatus::Done;
        Transition::changed(next)
    }

    fn synthesize(&self, state: &SoulMessage, synthesis: &SynthesisEvent) -> Transition {
        if state.trainer.is_some() {
            return Transition::ignored(state, Anomaly::TrainerAlreadyEscalated);
        }
        if state.synthesis_status.is_terminal() {
            return Transition::ignored(state, Anomaly::SynthesisAlreadySettled);
        }
        let mut next = state.clone();
        next.synthesis = Some(synthesis.output());
        next.mode = Some(ResponseMode::Autonomous);
        if synthesis.elapsed_ms.is_some() {
            next.elapsed_ms = synthesis.elapsed_ms;
        }
        next.synthesis_status = FacultyStatus::Done;
        Transition::changed(next)
    }

    fn escalate(&self, state: &SoulMessage, needs: &NeedsTrainerEvent) -> Transition {
        if state.synthesis_status.is_terminal() {
            return Transition::ignored(state, Anomaly::SynthesisAlreadySettled);
        }
        let mut next = state.clone();
        next.trainer = Some(needs.escalation());
        next.mode = Some(ResponseMode::NeedsTrainer);
        next.synthesis = Some(SynthesisOutput::new(
            self.awaiting_trainer_text.clone(),
            self.default_weights.to_map(),
        ));
        if needs.elapsed_ms.is_some() {
            next.elapsed_ms = needs.elapsed_ms;
        }
        next.synthesis_status = FacultyStatus::Done;
        Transition::changed(next)
    }

    fn finish(&self, state: &SoulMessage, done: &DoneEvent) -> Transition {
        let mut next = state.clone();
        next.streaming = false;
        if done.token_usage.is_some() {
            next.token_usage = done.token_usage;
        }
        if next.elapsed_ms.is_none() {
            next.elapsed_ms = done.elapsed_ms;
        }
        Transition::changed(next)
    }

    fn error(&self, state: &SoulMessage, error: &ErrorEvent) -> Transition {
        let mut next = state.clone();
        next.error = Some(error.error.clone());
        next.streaming = false;
        if let Some(faculty) = error.faculty() {
            let status = next.status_mut(faculty);
            if !status.is_terminal() {
                *status = FacultyStatus::Error;
            }
        }
        Transition::changed(next)
    }
}
