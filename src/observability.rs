use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("soulai.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("soulai.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("soulai.client.request_duration_seconds");

pub(crate) static STREAM_OPENS: Counter = Counter::new("soulai.stream.opens");
pub(crate) static STREAM_OPEN_ERRORS: Counter = Counter::new("soulai.stream.open_errors");
pub(crate) static STREAM_EVENTS: Counter = Counter::new("soulai.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("soulai.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("soulai.stream.bytes");
pub(crate) static STREAM_MALFORMED_FRAMES: Counter =
    Counter::new("soulai.stream.malformed_frames");
pub(crate) static STREAM_DISCARDED_PARTIALS: Counter =
    Counter::new("soulai.stream.discarded_partial_frames");

pub(crate) static TURN_STARTED: Counter = Counter::new("soulai.turn.started");
pub(crate) static TURN_COMPLETED: Counter = Counter::new("soulai.turn.completed");
pub(crate) static TURN_FAILED: Counter = Counter::new("soulai.turn.failed");
pub(crate) static TURN_INCOMPLETE: Counter = Counter::new("soulai.turn.incomplete");
pub(crate) static TURN_ANOMALIES: Counter = Counter::new("soulai.turn.anomalies");
pub(crate) static TURN_DURATION: Moments = Moments::new("soulai.turn.duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_OPENS);
    collector.register_counter(&STREAM_OPEN_ERRORS);
    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_MALFORMED_FRAMES);
    collector.register_counter(&STREAM_DISCARDED_PARTIALS);

    collector.register_counter(&TURN_STARTED);
    collector.register_counter(&TURN_COMPLETED);
    collector.register_counter(&TURN_FAILED);
    collector.register_counter(&TURN_INCOMPLETE);
    collector.register_counter(&TURN_ANOMALIES);
    collector.register_moments(&TURN_DURATION);
}
