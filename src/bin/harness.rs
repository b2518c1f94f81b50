//! The harness process: spawns the relay, triggers event publication
//! through the external command, collects the relayed events, and exits 0
//! only if the full scenario passed.

use std::io;

use anyhow::{anyhow, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use relayvisor::harness::{HarnessConfig, Scenario};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cfg = HarnessConfig::from_env()?;
    let verdict = Scenario::new(cfg).run().await;

    if verdict.passed {
        info!(
            received = verdict.received,
            expected = verdict.expected,
            "integration scenario passed"
        );
        Ok(())
    } else {
        Err(anyhow!(
            "integration scenario failed (received {} of {} events): {}",
            verdict.received,
            verdict.expected,
            verdict.reason.unwrap_or_else(|| "unknown failure".into())
        ))
    }
}
