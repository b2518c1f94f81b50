//! # HarnessSession: the supervisor-side message state machine.
//!
//! Applies every message observed on the channel to the session state and
//! reports what happened. The session is deliberately free of I/O and time,
//! so the decision rules stay testable on their own:
//!
//! - `ready` latches exactly once; late or duplicate `ready` is ignored.
//! - every `event` message is appended to an ordered log — the log, not any
//!   count reported by the relay, is the ground truth for the verdict.
//! - `done` is cross-validated: a reported count above the observed log
//!   length is an integrity violation and fails the scenario immediately.
//! - `error` and `timeout` are recorded as a child-side failure note; the
//!   surrounding phase surfaces the failure through its own timeout.

use crate::error::HarnessError;
use crate::ipc::Message;

/// What applying one message to the session did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The `ready` latch flipped.
    Ready,
    /// One more event was logged; carries the new log length.
    Event {
        /// Observed log length after appending.
        total: usize,
    },
    /// A `done` report that passed cross-validation.
    Done,
    /// The relay reported a failure (`error` or `timeout`).
    ChildFailure,
    /// Nothing to act on (duplicate `ready`, `end`, `shutdown`).
    Ignored,
}

/// Supervisor-side session state for one scenario run.
#[derive(Debug)]
pub struct HarnessSession {
    expected: usize,
    ready: bool,
    events: Vec<u64>,
    child_failure: Option<String>,
}

impl HarnessSession {
    /// Creates a session expecting `expected` events.
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            ready: false,
            events: Vec::new(),
            child_failure: None,
        }
    }

    /// Applies one observed message.
    pub fn observe(&mut self, message: &Message) -> Result<Observation, HarnessError> {
        match message {
            Message::Ready => {
                if self.ready {
                    return Ok(Observation::Ignored);
                }
                self.ready = true;
                Ok(Observation::Ready)
            }
            Message::Event { count } => {
                self.events.push(*count);
                Ok(Observation::Event {
                    total: self.events.len(),
                })
            }
            Message::Done { count } => {
                if *count > self.events.len() as u64 {
                    return Err(HarnessError::IntegrityViolation {
                        reported: *count,
                        observed: self.events.len(),
                    });
                }
                Ok(Observation::Done)
            }
            Message::Error { error } => {
                self.child_failure = Some(error.clone());
                Ok(Observation::ChildFailure)
            }
            Message::Timeout => {
                self.child_failure = Some("relay timed out waiting for events".into());
                Ok(Observation::ChildFailure)
            }
            Message::End | Message::Shutdown => Ok(Observation::Ignored),
        }
    }

    /// True once `ready` was observed.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Number of individually observed `event` messages.
    pub fn observed(&self) -> usize {
        self.events.len()
    }

    /// The ordered log of observed event counts.
    pub fn events(&self) -> &[u64] {
        &self.events
    }

    /// Number of events the scenario requires.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// True once the observed log satisfies the target.
    pub fn target_met(&self) -> bool {
        self.events.len() >= self.expected
    }

    /// The most recent child-reported failure, if any.
    pub fn child_failure(&self) -> Option<&str> {
        self.child_failure.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_latches_exactly_once() {
        let mut s = HarnessSession::new(3);
        assert_eq!(s.observe(&Message::Ready).unwrap(), Observation::Ready);
        assert_eq!(s.observe(&Message::Ready).unwrap(), Observation::Ignored);
        assert!(s.is_ready());
    }

    #[test]
    fn test_events_accumulate_in_order() {
        let mut s = HarnessSession::new(3);
        for count in 1..=3u64 {
            s.observe(&Message::Event { count }).unwrap();
        }
        assert_eq!(s.events(), &[1, 2, 3]);
        assert!(s.target_met());
    }

    #[test]
    fn test_done_reporting_more_than_observed_is_a_violation() {
        let mut s = HarnessSession::new(3);
        s.observe(&Message::Event { count: 1 }).unwrap();

        let err = s.observe(&Message::Done { count: 3 }).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::IntegrityViolation {
                reported: 3,
                observed: 1
            }
        ));
    }

    #[test]
    fn test_done_matching_observed_passes() {
        let mut s = HarnessSession::new(3);
        for count in 1..=3u64 {
            s.observe(&Message::Event { count }).unwrap();
        }
        assert_eq!(
            s.observe(&Message::Done { count: 3 }).unwrap(),
            Observation::Done
        );
    }

    #[test]
    fn test_child_failure_is_noted_not_fatal() {
        let mut s = HarnessSession::new(3);
        assert_eq!(
            s.observe(&Message::Error {
                error: "stream lost".into()
            })
            .unwrap(),
            Observation::ChildFailure
        );
        assert_eq!(s.child_failure(), Some("stream lost"));
    }

    #[test]
    fn test_end_and_shutdown_are_ignored() {
        let mut s = HarnessSession::new(3);
        assert_eq!(s.observe(&Message::End).unwrap(), Observation::Ignored);
        assert_eq!(s.observe(&Message::Shutdown).unwrap(), Observation::Ignored);
        assert_eq!(s.observed(), 0);
    }
}
