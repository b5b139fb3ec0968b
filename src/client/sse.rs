//! Server-Sent Events (SSE) framing for A2A streaming responses.
//!
//! Turns a response body into discrete [`Frame`]s:
//! - `event:` sets the frame's event type (last one wins)
//! - `data:` lines are concatenated with `\n`
//! - a blank line ends the frame; frames without data are dropped
//! - comments (`:`), `id:` and `retry:` are ignored
//!
//! The decoder knows nothing about JSON; payload interpretation happens in
//! [`crate::events`].

use std::collections::VecDeque;
use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};

use crate::error::A2AResult;

/// A boxed stream of raw body chunks, as produced by a [`super::Transport`].
pub type ByteStream = Pin<Box<dyn Stream<Item = A2AResult<Vec<u8>>> + Send>>;

/// One decoded SSE frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// The `event:` field, empty when the frame is untyped.
    pub event_type: String,
    /// The joined `data:` lines with trailing whitespace removed.
    pub data: String,
}

impl Frame {
    /// Create a typed frame.
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
        }
    }

    /// Create a frame without an `event:` field.
    pub fn untyped(data: impl Into<String>) -> Self {
        Self::new(String::new(), data)
    }

    /// Whether the frame carried no `event:` field.
    pub fn is_untyped(&self) -> bool {
        self.event_type.is_empty()
    }

    /// Render the frame back to SSE wire text, terminated by a blank line.
    ///
    /// ```
    /// use a2a_cli::client::Frame;
    ///
    /// let frame = Frame::new("status-update", "{\"a\":1}");
    /// assert_eq!(frame.encode(), "event: status-update\ndata: {\"a\":1}\n\n");
    /// ```
    pub fn encode(&self) -> String {
        let mut out = String::new();
        if !self.event_type.is_empty() {
            out.push_str("event: ");
            out.push_str(&self.event_type);
            out.push('\n');
        }
        for line in self.data.split('\n') {
            out.push_str("data: ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        out
    }
}

/// Incremental, line-driven SSE frame decoder.
///
/// # Example
///
/// ```
/// use a2a_cli::client::SseDecoder;
///
/// let mut decoder = SseDecoder::new();
/// assert!(decoder.push_line("event: message").is_none());
/// assert!(decoder.push_line("data: {\"x\":1}").is_none());
/// let frame = decoder.push_line("").unwrap();
/// assert_eq!(frame.event_type, "message");
/// assert_eq!(frame.data, "{\"x\":1}");
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    event_type: String,
    data: String,
}

impl SseDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without its terminator). Returns a frame when the line
    /// closes one.
    pub fn push_line(&mut self, line: &str) -> Option<Frame> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            return self.take_frame();
        }

        if let Some(value) = field_value(line, "event") {
            self.event_type = value.trim().to_string();
        } else if let Some(value) = field_value(line, "data") {
            self.data.push_str(value);
            self.data.push('\n');
        }

        None
    }

    /// Flush a frame left open at end of input (no trailing blank line).
    pub fn finish(&mut self) -> Option<Frame> {
        self.take_frame()
    }

    fn take_frame(&mut self) -> Option<Frame> {
        let event_type = std::mem::take(&mut self.event_type);
        let data = std::mem::take(&mut self.data);
        if data.is_empty() {
            return None;
        }
        Some(Frame {
            event_type,
            data: data.trim_end().to_string(),
        })
    }
}

/// `field:value` with one optional space after the colon.
fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(field)?.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Lazily decode frames from a sequence of lines.
///
/// Each call to this function starts from a fresh decoder state.
pub fn decode_lines<I>(lines: I) -> DecodeLines<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    DecodeLines {
        lines: lines.into_iter(),
        decoder: SseDecoder::new(),
        done: false,
    }
}

/// Iterator returned by [`decode_lines`].
#[derive(Debug)]
pub struct DecodeLines<I> {
    lines: I,
    decoder: SseDecoder,
    done: bool,
}

impl<I> Iterator for DecodeLines<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.done {
            return None;
        }
        for line in self.lines.by_ref() {
            if let Some(frame) = self.decoder.push_line(line.as_ref()) {
                return Some(frame);
            }
        }
        self.done = true;
        self.decoder.finish()
    }
}

/// Splits raw body chunks into lines.
///
/// Lines and multi-byte characters may be split across chunks; bytes are held
/// until their `\n` arrives. Invalid UTF-8 is replaced rather than rejected.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        // The held tail never contains a newline, so only new bytes are scanned.
        let mut search_from = self.pending.len();
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[search_from..].iter().position(|b| *b == b'\n') {
            let end = search_from + offset;
            lines.push(bytes_to_line(&self.pending[start..end]));
            start = end + 1;
            search_from = start;
        }
        self.pending.drain(..start);
        lines
    }

    /// Return the unterminated tail, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.pending);
        Some(bytes_to_line(&tail))
    }
}

fn bytes_to_line(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

struct FrameState<S> {
    bytes: S,
    lines: LineBuffer,
    decoder: SseDecoder,
    ready: VecDeque<Frame>,
    finished: bool,
}

impl<S> FrameState<S> {
    fn accept_line(&mut self, line: &str) {
        if let Some(frame) = self.decoder.push_line(line) {
            self.ready.push_back(frame);
        }
    }
}

/// Decode a stream of body chunks into a stream of frames.
///
/// Frames are yielded as soon as their terminating blank line arrives. A
/// transport error is yielded once and ends the stream.
pub fn frame_stream<S>(bytes: S) -> impl Stream<Item = A2AResult<Frame>>
where
    S: Stream<Item = A2AResult<Vec<u8>>> + Unpin,
{
    let state = FrameState {
        bytes,
        lines: LineBuffer::new(),
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = state.ready.pop_front() {
                return Some((Ok(frame), state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for line in state.lines.push(&chunk) {
                        state.accept_line(&line);
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    if let Some(line) = state.lines.finish() {
                        state.accept_line(&line);
                    }
                    if let Some(frame) = state.decoder.finish() {
                        state.ready.push_back(frame);
                    }
                }
            }
        }
    })
}
