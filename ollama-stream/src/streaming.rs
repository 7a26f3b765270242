//! NDJSON decode loop for the generate stream.
//!
//! The response body is a sequence of newline-separated JSON objects. Body
//! chunks do not align with lines, so bytes are buffered until a `\n` shows
//! up and each complete line is decoded on its own. Lines that do not decode
//! (keep-alive blanks, truncated JSON, wrong shapes) are skipped.

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::client::TokenSink;
use crate::error::{BoxError, StreamError, map_read_error};
use crate::types::StreamFrame;

/// How a successful stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A line carried `done: true`. Anything after it was left unread.
    Done,
    /// The server closed the body without sending `done: true`.
    EndOfStream,
}

/// Outcome of a successful streaming call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    /// Number of fragments handed to the sink.
    pub fragments: usize,
    /// Number of lines that were blank or failed to decode.
    pub skipped: usize,
    /// How the stream ended.
    pub termination: Termination,
}

/// Decode one line into a frame, or `None` if it is blank or malformed.
///
/// Only JSON objects are frames. Arrays are rejected even though serde would
/// map them onto the struct fields positionally.
///
/// ```
/// use ollama_stream::streaming::decode_frame;
///
/// let frame = decode_frame(br#"{"response":"Hel"}"#).unwrap();
/// assert_eq!(frame.response, "Hel");
/// assert!(decode_frame(b"   ").is_none());
/// assert!(decode_frame(br#"["Hel",true]"#).is_none());
/// ```
pub fn decode_frame(line: &[u8]) -> Option<StreamFrame> {
    let value: serde_json::Value = serde_json::from_slice(line).ok()?;
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Reassembles newline-terminated lines from arbitrarily split body chunks.
///
/// Splitting happens on raw bytes, so a UTF-8 sequence cut in half by the
/// network is joined again before the line is decoded.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a body chunk.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Take the next complete line, without its `\n`.
    pub fn next_line(&mut self) -> Option<Bytes> {
        let newline = self.buf.iter().position(|b| *b == b'\n')?;
        let mut line = self.buf.split_to(newline + 1);
        line.truncate(newline);
        Some(line.freeze())
    }

    /// Take whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<Bytes> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf.split().freeze())
        }
    }
}

/// Running counters for one decode pass.
#[derive(Default)]
struct Progress {
    fragments: usize,
    skipped: usize,
}

impl Progress {
    /// Handle one line. Returns `true` once a `done` frame has been seen.
    fn accept<K: TokenSink + ?Sized>(&mut self, line: &[u8], sink: &mut K) -> bool {
        let Some(frame) = decode_frame(line) else {
            self.skipped += 1;
            tracing::trace!(len = line.len(), "skipping undecodable stream line");
            return false;
        };

        if !frame.response.is_empty() {
            self.fragments += 1;
            sink.on_fragment(&frame.response);
        }

        frame.done
    }

    fn finish(self, termination: Termination) -> StreamSummary {
        tracing::debug!(
            fragments = self.fragments,
            skipped = self.skipped,
            ?termination,
            "generate stream finished"
        );
        StreamSummary {
            fragments: self.fragments,
            skipped: self.skipped,
            termination,
        }
    }
}

/// Drive the decode loop over a response body.
///
/// Fragments reach `sink` in wire order, one at a time. Every chunk read
/// races `cancel`; the token is also checked before each line is dispatched,
/// so nothing is delivered after cancellation is observed. A read failure or
/// cancellation returns [`StreamError::StreamInterrupted`].
pub async fn pump<S, E, K>(
    body: S,
    cancel: &CancellationToken,
    sink: &mut K,
) -> Result<StreamSummary, StreamError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
    K: TokenSink + ?Sized,
{
    let mut body = std::pin::pin!(body);
    let mut lines = LineBuffer::new();
    let mut progress = Progress::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StreamError::cancelled_mid_stream()),
            next = body.next() => next,
        };

        let Some(chunk) = next else { break };
        lines.extend(&chunk.map_err(map_read_error)?);

        while let Some(line) = lines.next_line() {
            if cancel.is_cancelled() {
                return Err(StreamError::cancelled_mid_stream());
            }
            if progress.accept(&line, sink) {
                return Ok(progress.finish(Termination::Done));
            }
        }
    }

    // A final line may arrive without its trailing newline.
    if let Some(line) = lines.finish() {
        if progress.accept(&line, sink) {
            return Ok(progress.finish(Termination::Done));
        }
    }

    Ok(progress.finish(Termination::EndOfStream))
}
