//! # Best-effort message sending.
//!
//! [`MessageSink`] is the capability the relay state machine sends through.
//! Delivery is best-effort by contract: if the channel is unavailable the
//! message is dropped with a warning and the caller's own logic proceeds
//! unchanged. A send failure is never fatal.

use std::io::Write;

use crate::ipc::Message;

/// Result of a single send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message was written to the channel.
    Sent,
    /// The channel was unavailable; the message was discarded.
    Dropped,
}

/// Sending capability for the inter-process channel.
///
/// Implementations must not block for long and must swallow their own I/O
/// failures — callers only ever observe [`SendOutcome`].
pub trait MessageSink: Send {
    /// Attempts to deliver one message.
    fn send(&mut self, message: &Message) -> SendOutcome;
}

/// Writes one JSON message per line to any [`Write`] target.
///
/// Production use wraps the process's stdout; tests can wrap a `Vec<u8>`.
/// Each send flushes so the supervisor observes messages promptly.
pub struct LineSink<W> {
    writer: W,
}

impl<W: Write + Send> LineSink<W> {
    /// Creates a sink over the given writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> MessageSink for LineSink<W> {
    fn send(&mut self, message: &Message) -> SendOutcome {
        let mut line = match serde_json::to_vec(message) {
            Ok(bytes) => bytes,
            Err(_) => return SendOutcome::Dropped,
        };
        line.push(b'\n');

        match self
            .writer
            .write_all(&line)
            .and_then(|()| self.writer.flush())
        {
            Ok(()) => SendOutcome::Sent,
            Err(err) => {
                tracing::warn!(tag = message.tag(), error = %err, "message dropped: channel unavailable");
                SendOutcome::Dropped
            }
        }
    }
}

/// In-memory sink that records every message, in order.
///
/// Used by tests and doc examples to assert on the exact message sequence a
/// state machine produced.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Vec<Message>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message sent so far, in send order.
    pub fn messages(&self) -> &[Message] {
        &self.sent
    }
}

impl MessageSink for RecordingSink {
    fn send(&mut self, message: &Message) -> SendOutcome {
        self.sent.push(message.clone());
        SendOutcome::Sent
    }
}
