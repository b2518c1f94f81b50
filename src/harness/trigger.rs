//! Invocation of the external trigger command.
//!
//! The trigger is whatever causes the event source to publish — typically a
//! CLI talking to the target environment. Its output is captured, a
//! non-zero exit code fails the scenario.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{info, warn};

use crate::error::HarnessError;
use crate::harness::HarnessConfig;

/// Runs the trigger command to completion and returns its stdout.
pub async fn run(cfg: &HarnessConfig) -> Result<String, HarnessError> {
    let (program, args) = cfg
        .trigger_command
        .split_first()
        .ok_or_else(|| HarnessError::Config {
            reason: "trigger command is empty".into(),
        })?;

    info!(command = %cfg.trigger_command.join(" "), "triggering event publication");
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        warn!(target: "trigger", "{}", stderr.trim());
    }

    if !output.status.success() {
        return Err(HarnessError::TriggerFailed {
            code: output.status.code(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !stdout.trim().is_empty() {
        info!(target: "trigger", "{}", stdout.trim());
    }
    info!("events published");
    Ok(stdout)
}
