//! The relay process: subscribes to the external event bus and reports
//! progress to a supervising parent over stdout, one JSON message per line.
//! Exits 0 once the target count is reached or on graceful shutdown, 1 on
//! any connection, subscription, or timeout failure.

use std::io;

use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relayvisor::ipc::LineSink;
use relayvisor::relay::{shutdown, RelayConfig, RelaySession};
use relayvisor::source::ScriptedSource;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // stdout is the message channel; all logging goes to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cfg = RelayConfig::from_env()?;
    let Some(script) = cfg.script.clone() else {
        bail!("no event-source binding is compiled into this build; set RELAY_SCRIPT to use the scripted source");
    };
    let mut source = ScriptedSource::new(cfg.credentials.clone(), script);
    let mut sink = LineSink::new(io::stdout());

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if shutdown::wait_for_shutdown_signal().await.is_ok() {
            signal_token.cancel();
        }
    });

    let outcome = RelaySession::new(&cfg)
        .run(&mut source, &mut sink, token)
        .await?;
    info!(outcome = outcome.as_label(), "relay finished");
    Ok(())
}
