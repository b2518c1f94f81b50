//! # Harness configuration.
//!
//! [`HarnessConfig`] bundles the commands and timing knobs for one scenario
//! run. The defaults are the reference configuration: 3 events, 30s to
//! become ready, 10s settle after the trigger, 60s to collect, 1s poll.
//!
//! ## Variables
//! - `HARNESS_TRIGGER_CMD` — required; the external command that causes the
//!   event source to publish (split on whitespace)
//! - `HARNESS_RELAY_CMD` — optional; defaults to the `relay` binary next to
//!   the harness executable

use std::env;
use std::time::Duration;

use crate::error::HarnessError;

/// Configuration for one scenario run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Command line that starts the relay; empty means "sibling binary".
    pub relay_command: Vec<String>,
    /// Extra environment for the relay child (credentials, script, ...).
    pub relay_env: Vec<(String, String)>,
    /// Command line that triggers event publication.
    pub trigger_command: Vec<String>,
    /// Number of events that counts as success.
    pub expected_events: usize,
    /// Window for the relay to report `ready` after launch.
    pub ready_timeout: Duration,
    /// Propagation wait after a successful trigger, before collecting.
    pub settle_delay: Duration,
    /// Window for the observed event log to reach the target.
    pub collect_timeout: Duration,
    /// How often the collection loop re-checks its condition.
    pub poll_interval: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            relay_command: Vec::new(),
            relay_env: Vec::new(),
            trigger_command: Vec::new(),
            expected_events: 3,
            ready_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(10),
            collect_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl HarnessConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, HarnessError> {
        let trigger_command = split_command(&require_env("HARNESS_TRIGGER_CMD")?);
        if trigger_command.is_empty() {
            return Err(HarnessError::Config {
                reason: "HARNESS_TRIGGER_CMD must name a command".into(),
            });
        }

        let relay_command = env::var("HARNESS_RELAY_CMD")
            .map(|raw| split_command(&raw))
            .unwrap_or_default();

        Ok(Self {
            relay_command,
            trigger_command,
            ..Self::default()
        })
    }

    /// Resolves the relay command, defaulting to the `relay` binary that
    /// ships next to the current executable.
    pub fn resolve_relay_command(&self) -> Result<Vec<String>, HarnessError> {
        if !self.relay_command.is_empty() {
            return Ok(self.relay_command.clone());
        }

        let exe = env::current_exe()?;
        let sibling = exe
            .parent()
            .ok_or_else(|| HarnessError::Config {
                reason: "cannot locate the directory of the current executable".into(),
            })?
            .join(format!("relay{}", env::consts::EXE_SUFFIX));
        Ok(vec![sibling.to_string_lossy().into_owned()])
    }

    /// The poll interval, clamped so the collection loop never spins.
    pub fn poll_interval_clamped(&self) -> Duration {
        self.poll_interval.max(Duration::from_millis(10))
    }
}

fn require_env(key: &str) -> Result<String, HarnessError> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| HarnessError::Config {
            reason: format!("{key} is not set"),
        })
}

fn split_command(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_configuration() {
        let cfg = HarnessConfig::default();
        assert_eq!(cfg.expected_events, 3);
        assert_eq!(cfg.ready_timeout, Duration::from_secs(30));
        assert_eq!(cfg.settle_delay, Duration::from_secs(10));
        assert_eq!(cfg.collect_timeout, Duration::from_secs(60));
        assert_eq!(cfg.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_resolve_relay_command_prefers_explicit() {
        let cfg = HarnessConfig {
            relay_command: vec!["./custom-relay".into(), "--flag".into()],
            ..HarnessConfig::default()
        };
        assert_eq!(
            cfg.resolve_relay_command().unwrap(),
            vec!["./custom-relay".to_string(), "--flag".to_string()]
        );
    }

    #[test]
    fn test_resolve_relay_command_defaults_to_sibling() {
        let cfg = HarnessConfig::default();
        let resolved = cfg.resolve_relay_command().unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].contains("relay"));
    }

    #[test]
    fn test_poll_interval_is_clamped() {
        let cfg = HarnessConfig {
            poll_interval: Duration::ZERO,
            ..HarnessConfig::default()
        };
        assert_eq!(cfg.poll_interval_clamped(), Duration::from_millis(10));
    }
}
