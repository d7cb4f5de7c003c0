//! Server-Sent Events processing for streaming turns.
//!
//! This module turns the raw byte stream of a turn's response body into a
//! stream of typed [`StreamEvent`]s.  Bytes accumulate in a buffer; complete
//! frames (terminated by a blank line) are cut from the front of the buffer and
//! decoded, and any trailing partial frame waits for the next chunk.  A frame is
//! never decoded before its terminating delimiter has been seen.
//!
//! Frames that cannot be decoded are dropped without ending the stream.

use bytes::{Buf, Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use tokio_util::codec::Decoder;

use crate::observability::{
    STREAM_BYTES, STREAM_DISCARDED_PARTIALS, STREAM_ERRORS, STREAM_EVENTS,
    STREAM_MALFORMED_FRAMES,
};
use crate::{Error, EventKind, Result, StreamEvent};

/// The delimiter between frames.
const FRAME_DELIMITER: &[u8] = b"\n\n";

/// Process a stream of bytes into a stream of protocol events.
///
/// The returned stream yields one item per decodable frame, in the order the
/// frames appear in the body.  A read error from `byte_stream` is yielded as
/// [`Error::Streaming`] and ends the stream.  When `byte_stream` ends, any
/// partial frame left in the buffer is discarded.
pub fn process_sse<S, E>(byte_stream: S) -> impl Stream<Item = Result<StreamEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    let state = SseState {
        stream: byte_stream,
        buffer: BytesMut::new(),
        codec: FrameCodec::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }

            // Drain every complete frame already buffered before reading more.
            while let Some(frame) = state.codec.decode(&mut state.buffer).ok().flatten() {
                if let Some(event) = decode_frame(&frame) {
                    STREAM_EVENTS.click();
                    return Some((Ok(event), state));
                }
            }

            match state.stream.next().await {
                Some(Ok(bytes)) => {
                    STREAM_BYTES.count(bytes.len() as u64);
                    state.buffer.extend_from_slice(&bytes);
                }
                Some(Err(e)) => {
                    STREAM_ERRORS.click();
                    state.finished = true;
                    let err = Error::streaming(
                        format!("Error in HTTP stream: {e}"),
                        Some(Box::new(e)),
                    );
                    return Some((Err(err), state));
                }
                None => {
                    state.finished = true;
                    state.codec.discard_partial(&mut state.buffer);
                    return None;
                }
            }
        }
    })
}

struct SseState<S> {
    stream: S,
    buffer: BytesMut,
    codec: FrameCodec,
    finished: bool,
}

/// Splits an accumulation buffer into raw frames.
///
/// Each decoded item is one frame's bytes without its trailing blank line.
/// The codec remembers how far it has already scanned so that a frame arriving
/// one byte at a time is not rescanned from the start on every chunk.
#[derive(Debug, Default)]
pub struct FrameCodec {
    scanned: usize,
}

impl FrameCodec {
    /// Create a new frame codec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop whatever is left in `src` once the body has ended.
    ///
    /// Call only after [`Decoder::decode`] has returned `None`; any bytes left
    /// are an unterminated frame.
    pub fn discard_partial(&mut self, src: &mut BytesMut) {
        if !src.iter().all(u8::is_ascii_whitespace) {
            STREAM_DISCARDED_PARTIALS.click();
            tracing::debug!(bytes = src.len(), "discarding partial frame at end of stream");
        }
        src.clear();
        self.scanned = 0;
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        // Back up one byte so a delimiter straddling two chunks is found.
        let start = self.scanned.saturating_sub(FRAME_DELIMITER.len() - 1);
        let found = src[start..]
            .windows(FRAME_DELIMITER.len())
            .position(|window| window == FRAME_DELIMITER);
        match found {
            Some(offset) => {
                let end = start + offset;
                let frame = src.split_to(end).freeze();
                src.advance(FRAME_DELIMITER.len());
                self.scanned = 0;
                Ok(Some(frame))
            }
            None => {
                self.scanned = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        self.discard_partial(src);
        Ok(None)
    }
}

/// The `event:` name and joined `data:` payload of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// The event name, if the frame carried an `event:` line.
    pub event: Option<String>,
    /// The data payload, if the frame carried at least one `data:` line.
    pub data: Option<String>,
}

impl RawFrame {
    /// Split a frame's text into its event name and data payload.
    ///
    /// The first `event:` line names the event.  `data:` lines are joined with
    /// newlines, and lines without a field name that follow a `data:` line are
    /// kept as part of the payload.  Comment lines (starting with `:`) and
    /// `id:`/`retry:` fields are ignored.
    pub fn parse(text: &str) -> Self {
        let mut event: Option<String> = None;
        let mut data: Option<String> = None;
        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.starts_with(':') || line.starts_with("id:") || line.starts_with("retry:") {
                continue;
            }
            if let Some(name) = line.strip_prefix("event:") {
                if event.is_none() {
                    event = Some(name.trim().to_string());
                }
                continue;
            }
            if let Some(payload) = line.strip_prefix("data:") {
                let payload = payload.strip_prefix(' ').unwrap_or(payload);
                match data.as_mut() {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(payload);
                    }
                    None => data = Some(payload.to_string()),
                }
                continue;
            }
            if let Some(existing) = data.as_mut() {
                existing.push('\n');
                existing.push_str(line);
            }
        }
        Self { event, data }
    }

    /// True if the frame carries neither an event name nor data.
    pub fn is_empty(&self) -> bool {
        self.event.is_none() && self.data.is_none()
    }
}

/// Decode one complete frame, or `None` if it should be dropped.
fn decode_frame(frame: &[u8]) -> Option<StreamEvent> {
    let text = match std::str::from_utf8(frame) {
        Ok(text) => text,
        Err(e) => {
            return malformed(format!("invalid UTF-8 in frame: {e}"));
        }
    };
    let raw = RawFrame::parse(text);
    if raw.is_empty() {
        // Blank or comment-only frames are keep-alives, not malformed input.
        return None;
    }
    let Some(name) = raw.event.filter(|name| !name.is_empty()) else {
        return malformed("frame has no event name".to_string());
    };
    let Some(data) = raw.data else {
        return malformed(format!("{name} frame has no data line"));
    };
    let kind = match name.parse::<EventKind>() {
        Ok(kind) => kind,
        Err(e) => return malformed(e.to_string()),
    };
    match StreamEvent::decode(kind, data.trim()) {
        Ok(event) => Some(event),
        Err(e) => malformed(e.to_string()),
    }
}

fn malformed(reason: String) -> Option<StreamEvent> {
    STREAM_MALFORMED_FRAMES.click();
    tracing::debug!(%reason, "dropping malformed frame");
    None
}
