//! # RelaySession: the subscriber state machine.
//!
//! Owns one run of the relay process: connect, subscribe, then wait for
//! events until a terminal condition. Progress is reported over the message
//! channel; human-readable status goes to the log.
//!
//! ## Phases
//! ```text
//! Connecting ──connect()──► Subscribing ──subscribe()──► AwaitingEvents
//!     │ failure                  │ failure                    │
//!     ▼                          ▼                            ▼
//!   send `error`, fail         send `error`, fail     send `ready`, arm
//!                                                     dead-man timer
//!
//! AwaitingEvents, per signal:
//!   event     → count += 1, send `event{count}`
//!               count == target → send `done{count}`, success
//!   error     → send `error`, fail          (ignored while shutting down)
//!   end       → send `end`, keep waiting    (dead-man still armed)
//!   dead-man  → send `timeout`, fail        (ignored while shutting down)
//!   shutdown  → send `shutdown`, success    (pre-empts everything, once)
//! ```
//!
//! ## Rules
//! - `events_received` is monotonic: +1 per delivery, exactly once.
//! - Reaching the target is an immediate success exit; whatever the
//!   subscription might still deliver afterwards is never observed.
//! - The shutdown flag is set once and never reset; after it is set, no
//!   `done`, `error`, or `timeout` message is emitted.
//! - Every send is best-effort; a dropped message never changes a decision.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::RelayError;
use crate::ipc::{Message, MessageSink};
use crate::relay::RelayConfig;
use crate::source::{EventSource, SourceSignal};

/// How a relay run ended successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The expected number of events arrived.
    TargetReached {
        /// Final delivery count.
        count: u64,
    },
    /// An external signal requested graceful termination.
    Shutdown,
}

impl RelayOutcome {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RelayOutcome::TargetReached { .. } => "target_reached",
            RelayOutcome::Shutdown => "shutdown",
        }
    }
}

/// What a signal handler decided.
enum Step {
    /// Keep waiting for further signals.
    Continue,
    /// The run is over; the process exits with this result.
    Finish(Result<RelayOutcome, RelayError>),
}

/// State for one relay run.
///
/// Handlers mutate the session and return a [`Step`]; [`RelaySession::run`]
/// is the loop that feeds them from the source, the dead-man timer, and the
/// cancellation token.
pub struct RelaySession {
    topic: String,
    target: u32,
    deadman: Duration,
    events_received: u64,
    shutting_down: bool,
}

impl RelaySession {
    /// Creates a fresh session from the run configuration.
    pub fn new(cfg: &RelayConfig) -> Self {
        Self {
            topic: cfg.topic.clone(),
            target: cfg.target,
            deadman: cfg.deadman,
            events_received: 0,
            shutting_down: false,
        }
    }

    /// Drives the session to its terminal state.
    ///
    /// `shutdown` is the external cancellation input; the binary wires it to
    /// SIGINT/SIGTERM, tests cancel it directly.
    pub async fn run<S: EventSource>(
        mut self,
        source: &mut S,
        sink: &mut dyn MessageSink,
        shutdown: CancellationToken,
    ) -> Result<RelayOutcome, RelayError> {
        info!("connecting to event source");
        if let Err(err) = source.connect().await {
            error!(error = %err, "connection failed");
            sink.send(&Message::Error {
                error: err.to_string(),
            });
            return Err(err);
        }

        info!(topic = %self.topic, limit = self.target, "connected, subscribing");
        let mut signals = match source.subscribe(&self.topic, self.target).await {
            Ok(rx) => rx,
            Err(err) => {
                error!(error = %err, "subscription failed");
                sink.send(&Message::Error {
                    error: err.to_string(),
                });
                return Err(err);
            }
        };

        sink.send(&Message::Ready);
        info!(window = ?self.deadman, "subscription active, waiting for events");

        let deadman = tokio::time::sleep(self.deadman);
        tokio::pin!(deadman);
        let mut source_open = true;

        loop {
            let step = tokio::select! {
                biased;
                _ = shutdown.cancelled() => self.on_shutdown(sink),
                signal = signals.recv(), if source_open => match signal {
                    Some(SourceSignal::Event { payload }) => self.on_event(&payload, sink),
                    Some(SourceSignal::Error { reason }) => self.on_source_error(reason, sink),
                    Some(SourceSignal::End) => self.on_source_end(sink),
                    // The binding went away without a notice; the dead-man
                    // timer still bounds the wait.
                    None => {
                        source_open = false;
                        Step::Continue
                    }
                },
                _ = &mut deadman => self.on_deadman(sink),
            };

            if let Step::Finish(result) = step {
                return result;
            }
        }
    }

    fn on_event(&mut self, payload: &serde_json::Value, sink: &mut dyn MessageSink) -> Step {
        self.events_received += 1;
        info!(count = self.events_received, payload = %payload, "event received");
        sink.send(&Message::Event {
            count: self.events_received,
        });

        if self.events_received >= u64::from(self.target) && !self.shutting_down {
            info!(count = self.events_received, "target reached");
            sink.send(&Message::Done {
                count: self.events_received,
            });
            return Step::Finish(Ok(RelayOutcome::TargetReached {
                count: self.events_received,
            }));
        }
        Step::Continue
    }

    fn on_source_error(&mut self, reason: String, sink: &mut dyn MessageSink) -> Step {
        if self.shutting_down {
            return Step::Continue;
        }
        error!(reason = %reason, "subscription error");
        sink.send(&Message::Error {
            error: reason.clone(),
        });
        Step::Finish(Err(RelayError::Subscription { reason }))
    }

    fn on_source_end(&mut self, sink: &mut dyn MessageSink) -> Step {
        info!("subscription ended");
        sink.send(&Message::End);
        Step::Continue
    }

    fn on_deadman(&mut self, sink: &mut dyn MessageSink) -> Step {
        if self.shutting_down {
            return Step::Continue;
        }
        error!(window = ?self.deadman, "no terminal condition within the dead-man window");
        sink.send(&Message::Timeout);
        Step::Finish(Err(RelayError::Deadman {
            window: self.deadman,
        }))
    }

    fn on_shutdown(&mut self, sink: &mut dyn MessageSink) -> Step {
        if !self.shutting_down {
            self.shutting_down = true;
            info!("shutting down");
            sink.send(&Message::Shutdown);
        }
        Step::Finish(Ok(RelayOutcome::Shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::RecordingSink;
    use crate::source::{Credentials, Script, ScriptedSource};
    use serde_json::json;

    fn session() -> RelaySession {
        RelaySession::new(&RelayConfig::default())
    }

    fn credentials() -> Credentials {
        Credentials {
            access_token: "token".into(),
            instance_url: "https://bus.example".into(),
            organization_id: "org".into(),
        }
    }

    // --- handler-level tests ---

    #[test]
    fn test_events_increment_and_report_in_order() {
        let mut s = session();
        let mut sink = RecordingSink::new();

        assert!(matches!(s.on_event(&json!({}), &mut sink), Step::Continue));
        assert!(matches!(s.on_event(&json!({}), &mut sink), Step::Continue));

        assert_eq!(s.events_received, 2);
        assert_eq!(
            sink.messages(),
            &[Message::Event { count: 1 }, Message::Event { count: 2 }]
        );
    }

    #[test]
    fn test_done_emitted_exactly_at_target() {
        let mut s = session();
        let mut sink = RecordingSink::new();

        s.on_event(&json!({}), &mut sink);
        s.on_event(&json!({}), &mut sink);
        let step = s.on_event(&json!({}), &mut sink);

        assert!(matches!(
            step,
            Step::Finish(Ok(RelayOutcome::TargetReached { count: 3 }))
        ));
        assert_eq!(
            sink.messages(),
            &[
                Message::Event { count: 1 },
                Message::Event { count: 2 },
                Message::Event { count: 3 },
                Message::Done { count: 3 },
            ]
        );
    }

    #[test]
    fn test_error_terminates_when_not_shutting_down() {
        let mut s = session();
        let mut sink = RecordingSink::new();

        let step = s.on_source_error("stream lost".into(), &mut sink);
        assert!(matches!(
            step,
            Step::Finish(Err(RelayError::Subscription { .. }))
        ));
        assert_eq!(
            sink.messages(),
            &[Message::Error {
                error: "stream lost".into()
            }]
        );
    }

    #[test]
    fn test_end_does_not_terminate() {
        let mut s = session();
        let mut sink = RecordingSink::new();

        assert!(matches!(s.on_source_end(&mut sink), Step::Continue));
        assert_eq!(sink.messages(), &[Message::End]);
    }

    #[test]
    fn test_no_terminal_message_after_shutdown() {
        let mut s = session();
        let mut sink = RecordingSink::new();

        assert!(matches!(
            s.on_shutdown(&mut sink),
            Step::Finish(Ok(RelayOutcome::Shutdown))
        ));
        // none of these may emit while shutting down
        assert!(matches!(s.on_deadman(&mut sink), Step::Continue));
        assert!(matches!(
            s.on_source_error("late".into(), &mut sink),
            Step::Continue
        ));
        assert_eq!(sink.messages(), &[Message::Shutdown]);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut s = session();
        let mut sink = RecordingSink::new();

        s.on_shutdown(&mut sink);
        s.on_shutdown(&mut sink);
        assert_eq!(sink.messages(), &[Message::Shutdown]);
    }

    // --- full-run tests against the scripted source ---

    #[tokio::test(start_paused = true)]
    async fn test_run_reaches_target_and_reports_done() {
        let mut source = ScriptedSource::new(
            credentials(),
            Script::events(3, Duration::from_millis(10)),
        );
        let mut sink = RecordingSink::new();

        let outcome = session()
            .run(&mut source, &mut sink, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, RelayOutcome::TargetReached { count: 3 });
        assert_eq!(
            sink.messages(),
            &[
                Message::Ready,
                Message::Event { count: 1 },
                Message::Event { count: 2 },
                Message::Event { count: 3 },
                Message::Done { count: 3 },
            ]
        );
    }

    #[tokio::test]
    async fn test_run_connect_failure_reports_error() {
        let mut source = ScriptedSource::new(Credentials::default(), Script::new());
        let mut sink = RecordingSink::new();

        let err = session()
            .run(&mut source, &mut sink, CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.as_label(), "relay_connection");
        assert_eq!(sink.messages().len(), 1);
        assert!(matches!(sink.messages()[0], Message::Error { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_deadman_expires_without_events() {
        let mut source = ScriptedSource::new(credentials(), Script::new());
        let mut sink = RecordingSink::new();

        let mut cfg = RelayConfig::default();
        cfg.deadman = Duration::from_millis(50);

        let err = RelaySession::new(&cfg)
            .run(&mut source, &mut sink, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Deadman { .. }));
        assert_eq!(sink.messages(), &[Message::Ready, Message::Timeout]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_end_keeps_waiting_until_deadman() {
        let mut source = ScriptedSource::new(
            credentials(),
            Script::new().end_after(Duration::from_millis(1)),
        );
        let mut sink = RecordingSink::new();

        let mut cfg = RelayConfig::default();
        cfg.deadman = Duration::from_millis(50);

        let err = RelaySession::new(&cfg)
            .run(&mut source, &mut sink, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Deadman { .. }));
        assert_eq!(
            sink.messages(),
            &[Message::Ready, Message::End, Message::Timeout]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_subscription_error_after_events() {
        let script = Script::new()
            .event_after(Duration::from_millis(1), json!({"sequence": 1}))
            .error_after(Duration::from_millis(1), "stream lost");
        let mut source = ScriptedSource::new(credentials(), script);
        let mut sink = RecordingSink::new();

        let err = session()
            .run(&mut source, &mut sink, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Subscription { .. }));
        assert_eq!(
            sink.messages(),
            &[
                Message::Ready,
                Message::Event { count: 1 },
                Message::Error {
                    error: "stream lost".into()
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_shutdown_preempts_everything() {
        let mut source = ScriptedSource::new(
            credentials(),
            Script::events(3, Duration::from_secs(1)),
        );
        let mut sink = RecordingSink::new();

        let token = CancellationToken::new();
        token.cancel();

        let outcome = session()
            .run(&mut source, &mut sink, token)
            .await
            .unwrap();

        assert_eq!(outcome, RelayOutcome::Shutdown);
        assert_eq!(sink.messages(), &[Message::Ready, Message::Shutdown]);
    }
}
