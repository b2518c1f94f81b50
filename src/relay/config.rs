//! # Relay process configuration.
//!
//! [`RelayConfig`] is read from the environment at process start. The
//! credentials are opaque and merely forwarded to the client binding; they
//! must all be present, otherwise startup fails with a connection error
//! before anything is attempted.
//!
//! ## Variables
//! - `RELAY_ACCESS_TOKEN`, `RELAY_INSTANCE_URL`, `RELAY_ORG_ID` — required
//! - `RELAY_TOPIC` — subscription topic (default `orders/activated`)
//! - `RELAY_TARGET` — events to wait for before a success exit (default 3)
//! - `RELAY_DEADMAN_SECS` — dead-man window in seconds (default 90)
//! - `RELAY_SCRIPT` — optional, selects the scripted source (`3@1000ms`)

use std::env;
use std::time::Duration;

use crate::error::RelayError;
use crate::source::{Credentials, Script};

const DEFAULT_TOPIC: &str = "orders/activated";
const DEFAULT_TARGET: u32 = 3;
const DEFAULT_DEADMAN: Duration = Duration::from_secs(90);

/// Configuration for one relay run.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Opaque credentials handed to the client binding.
    pub credentials: Credentials,
    /// Event channel to subscribe to.
    pub topic: String,
    /// Number of events that counts as success.
    pub target: u32,
    /// Window after subscribing in which a terminal condition must occur.
    pub deadman: Duration,
    /// When set, the run uses the scripted source instead of a real binding.
    pub script: Option<Script>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            topic: DEFAULT_TOPIC.to_string(),
            target: DEFAULT_TARGET,
            deadman: DEFAULT_DEADMAN,
            script: None,
        }
    }
}

impl RelayConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, RelayError> {
        let credentials = Credentials {
            access_token: require_env("RELAY_ACCESS_TOKEN")?,
            instance_url: require_env("RELAY_INSTANCE_URL")?,
            organization_id: require_env("RELAY_ORG_ID")?,
        };

        let topic = env::var("RELAY_TOPIC").unwrap_or_else(|_| DEFAULT_TOPIC.to_string());

        let target = match env::var("RELAY_TARGET") {
            Ok(raw) => raw.parse().map_err(|_| RelayError::Config {
                reason: format!("RELAY_TARGET must be a positive integer, got '{raw}'"),
            })?,
            Err(_) => DEFAULT_TARGET,
        };

        let deadman = match env::var("RELAY_DEADMAN_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| RelayError::Config {
                    reason: format!("RELAY_DEADMAN_SECS must be a number of seconds, got '{raw}'"),
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => DEFAULT_DEADMAN,
        };

        let script = match env::var("RELAY_SCRIPT") {
            Ok(raw) => Some(Script::parse(&raw)?),
            Err(_) => None,
        };

        Ok(Self {
            credentials,
            topic,
            target,
            deadman,
            script,
        })
    }
}

/// Reads a required variable; absence is an authentication failure because
/// the binding cannot connect without it.
fn require_env(key: &str) -> Result<String, RelayError> {
    env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| RelayError::Connection {
            reason: format!("{key} is not set"),
        })
}
