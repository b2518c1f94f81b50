//! # Tagged messages exchanged over the inter-process channel.
//!
//! [`Message`] is the finite vocabulary of cross-process signals. From the
//! relay's perspective the valid sequence is:
//!
//! ```text
//! ready → event{1} → event{2} → ... → exactly one terminal:
//!                                       done{n}   (target reached)
//!                                       error{..} (fatal failure)
//!                                       timeout   (dead-man fired)
//!                                       shutdown  (signal received)
//! ```
//!
//! `end` is forwarded when the subscription closes on its own and does not
//! terminate the sequence — the relay may still be waiting on its dead-man
//! timer afterwards.
//!
//! ## Wire format
//! One JSON object per line, discriminated by a lowercase `type` tag:
//!
//! ```text
//! {"type":"ready"}
//! {"type":"event","count":1}
//! {"type":"done","count":3}
//! {"type":"error","error":"connection refused"}
//! ```
//!
//! Decoding is forward-compatible: unknown tags and malformed lines decode
//! to `None` and are skipped by consumers.

use serde::{Deserialize, Serialize};

/// One signal on the relay → supervisor channel.
///
/// Exactly one variant is active per line; the `type` tag discriminates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Connection and subscription succeeded; the relay is waiting for events.
    Ready,
    /// One event was delivered; `count` is the relay's running total.
    Event {
        /// Monotonically increasing delivery count, starting at 1.
        count: u64,
    },
    /// The target count was reached; `count` is the final total.
    Done {
        /// Final delivery count as reported by the relay.
        count: u64,
    },
    /// A fatal connection or subscription failure.
    Error {
        /// Human-readable description of the failure.
        error: String,
    },
    /// The subscription closed normally without reaching the target.
    End,
    /// The relay's dead-man timer fired with no terminal condition reached.
    Timeout,
    /// Graceful termination was requested by an external signal.
    Shutdown,
}

impl Message {
    /// Decodes a single channel line.
    ///
    /// Returns `None` for blank lines, malformed JSON, and unknown tags, so
    /// consumers skip anything they do not understand.
    pub fn decode(line: &str) -> Option<Message> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        serde_json::from_str(line).ok()
    }

    /// The lowercase wire tag, for logging.
    pub fn tag(&self) -> &'static str {
        match self {
            Message::Ready => "ready",
            Message::Event { .. } => "event",
            Message::Done { .. } => "done",
            Message::Error { .. } => "error",
            Message::End => "end",
            Message::Timeout => "timeout",
            Message::Shutdown => "shutdown",
        }
    }
}
