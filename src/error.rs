//! Error types used by the relay and harness processes.
//!
//! This module defines two main error enums:
//!
//! - [`RelayError`] — failures raised by the relay (subscriber) process.
//! - [`HarnessError`] — failures raised by the supervising harness.
//!
//! Both types provide helper methods (`as_label`) for logging, mirroring how
//! every fatal condition maps onto a process exit code of 1. A dropped
//! channel send is deliberately **not** represented here: best-effort message
//! delivery surfaces as [`SendOutcome::Dropped`](crate::ipc::SendOutcome) and
//! never fails the state machine.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the relay process.
///
/// Every variant is fatal to the relay: there are no automatic retries, a
/// failed run requires a fresh invocation of the whole scenario.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RelayError {
    /// Authentication or network failure before the subscription existed.
    #[error("connection failed: {reason}")]
    Connection {
        /// Description from the underlying client binding.
        reason: String,
    },

    /// The external client reported an error on an active subscription.
    #[error("subscription error: {reason}")]
    Subscription {
        /// Description from the underlying client binding.
        reason: String,
    },

    /// The dead-man timer fired: no terminal condition within the window.
    #[error("no events received within {window:?}")]
    Deadman {
        /// The configured dead-man window.
        window: Duration,
    },

    /// A configuration value was present but malformed.
    #[error("invalid configuration: {reason}")]
    Config {
        /// What was malformed, including the variable name.
        reason: String,
    },
}

impl RelayError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RelayError::Connection { .. } => "relay_connection",
            RelayError::Subscription { .. } => "relay_subscription",
            RelayError::Deadman { .. } => "relay_timeout",
            RelayError::Config { .. } => "relay_config",
        }
    }
}

/// # Errors produced by the harness process.
///
/// Each variant corresponds to one way a scenario phase can fail; the
/// scenario short-circuits on the first one and still tears the child down.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The relay never reported `ready` within the readiness window.
    #[error("relay did not become ready within {timeout:?}")]
    ReadyTimeout {
        /// The configured readiness timeout.
        timeout: Duration,
    },

    /// The relay process exited before reporting `ready`.
    #[error("relay exited with code {code:?} before becoming ready")]
    ExitedBeforeReady {
        /// Exit code of the child, if one was observed.
        code: Option<i32>,
    },

    /// The external trigger command exited non-zero.
    #[error("trigger command failed with exit code {code:?}")]
    TriggerFailed {
        /// Exit code of the trigger, if one was observed.
        code: Option<i32>,
    },

    /// The collection window elapsed before enough events were observed.
    #[error("timeout: expected {expected} events, received {received}")]
    CollectionTimeout {
        /// Number of events the scenario required.
        expected: usize,
        /// Number of individual `event` messages actually observed.
        received: usize,
    },

    /// The relay's `done` message claimed more events than were observed.
    ///
    /// The reported count is never accepted as ground truth; exceeding the
    /// observed log length means messages were lost or fabricated and the
    /// scenario fails immediately.
    #[error(
        "channel integrity violation: relay reported {reported} events \
         but only {observed} event messages were observed"
    )]
    IntegrityViolation {
        /// Count carried by the `done` message.
        reported: u64,
        /// Length of the harness's own event log.
        observed: usize,
    },

    /// A configuration value was missing or malformed.
    #[error("invalid configuration: {reason}")]
    Config {
        /// What was missing or malformed, including the variable name.
        reason: String,
    },

    /// Spawning or talking to a child process failed at the OS level.
    #[error("process error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HarnessError::ReadyTimeout { .. } => "harness_ready_timeout",
            HarnessError::ExitedBeforeReady { .. } => "harness_exited_before_ready",
            HarnessError::TriggerFailed { .. } => "harness_trigger_failed",
            HarnessError::CollectionTimeout { .. } => "harness_collection_timeout",
            HarnessError::IntegrityViolation { .. } => "harness_integrity_violation",
            HarnessError::Config { .. } => "harness_config",
            HarnessError::Io(_) => "harness_io",
        }
    }
}
