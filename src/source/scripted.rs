//! # Scripted event source.
//!
//! Replays a fixed sequence of signals with per-step delays, standing in for
//! the external bus wherever no real binding is wanted: state-machine tests,
//! the end-to-end scenario test, and the relay binary's scripted mode.
//!
//! The source still enforces the seam's contract: `connect` fails without
//! complete credentials, `subscribe` honors the requested event limit, and
//! delivery stops after a terminal step.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::RelayError;
use crate::source::{Credentials, EventSource, SourceSignal};

/// One scripted delivery.
#[derive(Debug, Clone)]
enum ScriptStep {
    Event {
        after: Duration,
        payload: serde_json::Value,
    },
    Error {
        after: Duration,
        reason: String,
    },
    End {
        after: Duration,
    },
}

/// A replayable sequence of source signals.
#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<ScriptStep>,
}

impl Script {
    /// An empty script: the subscription stays open and delivers nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` events, one every `interval`.
    ///
    /// Each payload carries its 1-based sequence number, so logs stay
    /// distinguishable.
    pub fn events(count: u32, interval: Duration) -> Self {
        let mut script = Self::new();
        for seq in 1..=count {
            script = script.event_after(interval, serde_json::json!({ "sequence": seq }));
        }
        script
    }

    /// Appends one event delivered `after` the previous step.
    pub fn event_after(mut self, after: Duration, payload: serde_json::Value) -> Self {
        self.steps.push(ScriptStep::Event { after, payload });
        self
    }

    /// Appends a terminal subscription error.
    pub fn error_after(mut self, after: Duration, reason: impl Into<String>) -> Self {
        self.steps.push(ScriptStep::Error {
            after,
            reason: reason.into(),
        });
        self
    }

    /// Appends a benign end-of-subscription notice.
    pub fn end_after(mut self, after: Duration) -> Self {
        self.steps.push(ScriptStep::End { after });
        self
    }

    /// Parses the compact `N@DELAYms` form used by the environment,
    /// e.g. `3@1000ms` for three events one second apart.
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        let invalid = || RelayError::Config {
            reason: format!("invalid script '{text}', expected the form '3@1000ms'"),
        };

        let (count, delay) = text.trim().split_once('@').ok_or_else(invalid)?;
        let count: u32 = count.parse().map_err(|_| invalid())?;
        let millis: u64 = delay
            .strip_suffix("ms")
            .ok_or_else(invalid)?
            .parse()
            .map_err(|_| invalid())?;

        Ok(Self::events(count, Duration::from_millis(millis)))
    }
}

/// In-memory [`EventSource`] that replays a [`Script`].
pub struct ScriptedSource {
    credentials: Credentials,
    script: Script,
    connected: bool,
}

impl ScriptedSource {
    /// Creates a source that will replay `script` once subscribed.
    pub fn new(credentials: Credentials, script: Script) -> Self {
        Self {
            credentials,
            script,
            connected: false,
        }
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn connect(&mut self) -> Result<(), RelayError> {
        if !self.credentials.is_complete() {
            return Err(RelayError::Connection {
                reason: "incomplete credentials".into(),
            });
        }
        self.connected = true;
        Ok(())
    }

    async fn subscribe(
        &mut self,
        _topic: &str,
        limit: u32,
    ) -> Result<mpsc::Receiver<SourceSignal>, RelayError> {
        if !self.connected {
            return Err(RelayError::Subscription {
                reason: "subscribe called before connect".into(),
            });
        }

        let steps = self.script.steps.clone();
        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            let mut delivered = 0u32;
            for step in steps {
                match step {
                    ScriptStep::Event { after, payload } => {
                        if delivered >= limit {
                            break;
                        }
                        tokio::time::sleep(after).await;
                        delivered += 1;
                        if tx.send(SourceSignal::Event { payload }).await.is_err() {
                            return;
                        }
                    }
                    ScriptStep::Error { after, reason } => {
                        tokio::time::sleep(after).await;
                        let _ = tx.send(SourceSignal::Error { reason }).await;
                        return;
                    }
                    ScriptStep::End { after } => {
                        tokio::time::sleep(after).await;
                        let _ = tx.send(SourceSignal::End).await;
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}
