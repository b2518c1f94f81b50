//! # Scenario: end-to-end orchestration and the verdict.
//!
//! Drives the three phases of the integration scenario and adjudicates
//! pass/fail. Whatever happens, the relay child is torn down before the
//! verdict is reported.
//!
//! ```text
//! run():
//!   spawn relay ──► phase 1: await `ready`   (ready_timeout, default 30s)
//!                   phase 2: run trigger, then settle (default 10s)
//!                   phase 3: collect events  (collect_timeout, default 60s,
//!                                             re-checked every poll_interval)
//!   teardown: terminate relay (always)
//!   verdict: pass only if all three phases completed
//! ```
//!
//! Failure modes per phase:
//! - launch: relay exits before `ready`, or the readiness window elapses;
//! - trigger: the external command exits non-zero;
//! - collect: the window elapses short of the target, or a `done` message
//!   reports more events than were individually observed (an integrity
//!   violation that fails the run immediately).

use tracing::{debug, error, info, warn};

use crate::error::HarnessError;
use crate::harness::child::{ChildEvent, RelayHandle};
use crate::harness::session::{HarnessSession, Observation};
use crate::harness::{trigger, HarnessConfig};

/// Final adjudication of one scenario run.
#[derive(Debug, Clone)]
pub struct Verdict {
    /// True only if every phase completed and the target was met.
    pub passed: bool,
    /// Number of individually observed `event` messages.
    pub received: usize,
    /// Number of events the scenario required.
    pub expected: usize,
    /// Human-readable failure reason, `None` on a pass.
    pub reason: Option<String>,
}

impl Verdict {
    /// Process exit code for this verdict.
    pub fn exit_code(&self) -> i32 {
        if self.passed {
            0
        } else {
            1
        }
    }
}

/// One configured scenario run.
pub struct Scenario {
    cfg: HarnessConfig,
}

impl Scenario {
    /// Creates a scenario with the given configuration.
    pub fn new(cfg: HarnessConfig) -> Self {
        Self { cfg }
    }

    /// Runs the scenario to its verdict. The relay child is always torn
    /// down, pass or fail.
    pub async fn run(&self) -> Verdict {
        info!("starting relay integration scenario");
        let mut session = HarnessSession::new(self.cfg.expected_events);

        let mut relay = match RelayHandle::spawn(&self.cfg) {
            Ok(relay) => relay,
            Err(err) => return self.verdict(&session, Err(err)),
        };

        let outcome = self.drive(&mut relay, &mut session).await;
        relay.terminate().await;
        self.verdict(&session, outcome)
    }

    /// The three phases, in order, short-circuiting on the first failure.
    async fn drive(
        &self,
        relay: &mut RelayHandle,
        session: &mut HarnessSession,
    ) -> Result<(), HarnessError> {
        self.await_ready(relay, session).await?;

        trigger::run(&self.cfg).await?;
        info!(delay = ?self.cfg.settle_delay, "waiting for events to propagate");
        tokio::time::sleep(self.cfg.settle_delay).await;

        self.collect(relay, session).await
    }

    /// Phase 1: the relay must report `ready` before the readiness window
    /// elapses; exiting first is equally fatal.
    async fn await_ready(
        &self,
        relay: &mut RelayHandle,
        session: &mut HarnessSession,
    ) -> Result<(), HarnessError> {
        info!(timeout = ?self.cfg.ready_timeout, "waiting for relay to become ready");
        let deadline = tokio::time::sleep(self.cfg.ready_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                event = relay.next_event() => match event {
                    ChildEvent::Message(message) => {
                        if session.observe(&message)? == Observation::Ready {
                            info!("relay is ready");
                            return Ok(());
                        }
                    }
                    ChildEvent::Exited(code) => {
                        return Err(HarnessError::ExitedBeforeReady { code });
                    }
                },
                _ = &mut deadline => {
                    return Err(HarnessError::ReadyTimeout {
                        timeout: self.cfg.ready_timeout,
                    });
                }
            }
        }
    }

    /// Phase 3: accumulate `event` messages until the target is met or the
    /// collection window elapses. A child exit only stops the draining; the
    /// phase itself ends on target or timeout.
    async fn collect(
        &self,
        relay: &mut RelayHandle,
        session: &mut HarnessSession,
    ) -> Result<(), HarnessError> {
        info!(
            expected = session.expected(),
            timeout = ?self.cfg.collect_timeout,
            "collecting events"
        );
        let deadline = tokio::time::sleep(self.cfg.collect_timeout);
        tokio::pin!(deadline);
        let mut poll = tokio::time::interval(self.cfg.poll_interval_clamped());
        let mut child_done = false;

        loop {
            if session.target_met() {
                info!(received = session.observed(), "target reached");
                return Ok(());
            }

            tokio::select! {
                biased;
                _ = &mut deadline => {
                    return Err(HarnessError::CollectionTimeout {
                        expected: session.expected(),
                        received: session.observed(),
                    });
                }
                event = relay.next_event(), if !child_done => match event {
                    ChildEvent::Message(message) => match session.observe(&message)? {
                        Observation::Event { total } => {
                            info!(total, "event received over the channel");
                        }
                        Observation::ChildFailure => {
                            warn!(failure = ?session.child_failure(), "relay reported a failure");
                        }
                        _ => {}
                    },
                    ChildEvent::Exited(code) => {
                        debug!(code = ?code, "relay exited during collection");
                        child_done = true;
                    }
                },
                _ = poll.tick() => {}
            }
        }
    }

    fn verdict(&self, session: &HarnessSession, outcome: Result<(), HarnessError>) -> Verdict {
        let received = session.observed();
        let expected = self.cfg.expected_events;
        match outcome {
            Ok(()) => {
                info!(received, expected, "scenario PASSED");
                Verdict {
                    passed: true,
                    received,
                    expected,
                    reason: None,
                }
            }
            Err(err) => {
                error!(
                    error = %err,
                    label = err.as_label(),
                    received,
                    expected,
                    "scenario FAILED"
                );
                Verdict {
                    passed: false,
                    received,
                    expected,
                    reason: Some(err.to_string()),
                }
            }
        }
    }
}
