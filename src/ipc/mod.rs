//! Inter-process message channel between the relay and its supervisor.
//!
//! The relay's stdout carries exactly one JSON-encoded [`Message`] per line;
//! everything human-readable goes to stderr. [`MessageSink`] is the sending
//! capability: delivery is best-effort and a failed send is reported as
//! [`SendOutcome::Dropped`], never as an error.

mod channel;
mod message;

pub use channel::{LineSink, MessageSink, RecordingSink, SendOutcome};
pub use message::Message;
