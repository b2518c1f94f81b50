//! OS signal handling for graceful relay shutdown.
//!
//! [`wait_for_shutdown_signal`] completes when the process receives an
//! interrupt or terminate signal. On Unix that is `SIGINT` (Ctrl-C) or
//! `SIGTERM` (the signal the harness sends during teardown); elsewhere only
//! [`tokio::signal::ctrl_c`] is awaited.

/// Waits for an interrupt or terminate signal.
///
/// Each call registers independent listeners. Returns `Ok(())` when a
/// signal arrives, or `Err` if listener registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
    }
    Ok(())
}

/// Waits for an interrupt signal.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
