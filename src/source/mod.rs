//! # The event-source seam.
//!
//! The external event bus is an opaque collaborator: its wire protocol,
//! authentication, and subscription semantics live in a client binding, not
//! here. [`EventSource`] is the trait such a binding satisfies, so the relay
//! state machine stays decoupled from any concrete client.
//!
//! A binding delivers [`SourceSignal`]s asynchronously over a channel:
//! events, a terminal error, or a benign end-of-subscription notice.
//!
//! [`ScriptedSource`] is the in-crate binding: it replays a configured
//! sequence with per-step delays and needs no external service, which is
//! what the integration scenario and every state-machine test run against.

mod scripted;

pub use scripted::{Script, ScriptedSource};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::RelayError;

/// Opaque credentials forwarded to the client binding.
///
/// All three fields must be non-empty for [`EventSource::connect`] to
/// succeed; the binding interprets them, this crate never does.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Pre-issued access token.
    pub access_token: String,
    /// Base URL of the service instance.
    pub instance_url: String,
    /// Identifier of the organization / tenant.
    pub organization_id: String,
}

impl Credentials {
    /// True when every field is present.
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty()
            && !self.instance_url.is_empty()
            && !self.organization_id.is_empty()
    }
}

/// One asynchronous notification from an active subscription.
#[derive(Debug, Clone)]
pub enum SourceSignal {
    /// A delivered event record.
    Event {
        /// Opaque event body as the binding decoded it.
        payload: serde_json::Value,
    },
    /// The subscription failed.
    Error {
        /// Description from the binding.
        reason: String,
    },
    /// The subscription closed normally.
    End,
}

/// Contract for a concrete event-bus client binding.
///
/// `connect` authenticates, `subscribe` requests a bounded subscription and
/// hands back the signal channel. A binding stops sending after a terminal
/// [`SourceSignal::Error`] or [`SourceSignal::End`], or once `limit` events
/// were delivered.
#[async_trait]
pub trait EventSource: Send {
    /// Authenticates against the external service.
    async fn connect(&mut self) -> Result<(), RelayError>;

    /// Subscribes to `topic`, requesting at most `limit` events.
    async fn subscribe(
        &mut self,
        topic: &str,
        limit: u32,
    ) -> Result<mpsc::Receiver<SourceSignal>, RelayError>;
}
