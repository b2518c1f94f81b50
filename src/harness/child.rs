//! # RelayHandle: the supervised relay child process.
//!
//! Spawns the relay with its stdout piped as the message channel and its
//! stderr forwarded into the harness log. Lines that decode to a [`Message`]
//! are queued for the scenario; anything else on stdout is skipped, so the
//! channel tolerates stray output.
//!
//! Teardown is signal-based and best-effort: SIGTERM first so the relay can
//! shut down gracefully, a force-kill only if it lingers. `kill_on_drop`
//! backstops abnormal harness exits.

use std::io;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::HarnessError;
use crate::harness::HarnessConfig;
use crate::ipc::Message;

/// How long a SIGTERM'd relay gets before the force-kill.
#[cfg(unix)]
const TERM_GRACE: std::time::Duration = std::time::Duration::from_secs(5);

/// One observation from the child: either a channel message or its exit.
#[derive(Debug)]
pub enum ChildEvent {
    /// A decoded message from the relay's stdout.
    Message(Message),
    /// The relay exited; carries the exit code if one was observed.
    Exited(Option<i32>),
}

/// Handle to a spawned relay process.
pub struct RelayHandle {
    child: Child,
    messages: mpsc::Receiver<Message>,
    stream_closed: bool,
}

impl RelayHandle {
    /// Spawns the relay configured in `cfg`.
    pub fn spawn(cfg: &HarnessConfig) -> Result<Self, HarnessError> {
        let command = cfg.resolve_relay_command()?;
        let (program, args) = command.split_first().ok_or_else(|| HarnessError::Config {
            reason: "relay command is empty".into(),
        })?;

        info!(command = %command.join(" "), "starting relay");
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &cfg.relay_env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HarnessError::Io(io::Error::other("relay stdout was not captured")))?;

        let (tx, messages) = mpsc::channel(64);
        tokio::spawn(pump_messages(stdout, tx));
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump_stderr(stderr));
        }

        info!(pid = ?child.id(), "relay started");
        Ok(Self {
            child,
            messages,
            stream_closed: false,
        })
    }

    /// Waits for the next child observation.
    ///
    /// Buffered messages are drained before an exit is reported, so the
    /// terminal `done`/`error` of a child that has already exited is still
    /// observed.
    pub async fn next_event(&mut self) -> ChildEvent {
        loop {
            tokio::select! {
                biased;
                msg = self.messages.recv(), if !self.stream_closed => match msg {
                    Some(message) => return ChildEvent::Message(message),
                    None => self.stream_closed = true,
                },
                status = self.child.wait() => {
                    return ChildEvent::Exited(status.ok().and_then(|s| s.code()));
                }
            }
        }
    }

    /// Terminates the relay: SIGTERM, bounded wait, then force-kill.
    ///
    /// Best-effort by design — a child that is already gone is fine.
    pub async fn terminate(&mut self) {
        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            info!(pid, "stopping relay");
            let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            if tokio::time::timeout(TERM_GRACE, self.child.wait())
                .await
                .is_ok()
            {
                return;
            }
            warn!(pid, "relay ignored SIGTERM, force-killing");
        }

        let _ = self.child.kill().await;
    }
}

/// Decodes stdout lines into messages until the stream closes.
async fn pump_messages(stdout: ChildStdout, tx: mpsc::Sender<Message>) {
    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match Message::decode(&line) {
            Some(message) => {
                if tx.send(message).await.is_err() {
                    break;
                }
            }
            None => {
                if !line.trim().is_empty() {
                    debug!(line = %line, "skipping unrecognized relay output");
                }
            }
        }
    }
}

/// Forwards the relay's stderr into the harness log.
async fn pump_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if !line.trim().is_empty() {
            info!(target: "relay", "{}", line);
        }
    }
}
