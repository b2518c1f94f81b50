//! # relayvisor
//!
//! **Relayvisor** couples a small event-relay process with the harness that
//! supervises it. The relay subscribes to an external event bus through an
//! opaque client binding, forwards every delivery to its parent over a
//! line-oriented message channel, and exits as soon as the expected number of
//! events has arrived. The harness spawns the relay, triggers event
//! publication through an external command, and adjudicates pass/fail from
//! the messages it observes.
//!
//! ## Architecture
//! ```text
//!            harness process                      relay process
//! ┌────────────────────────────────┐   ┌────────────────────────────────┐
//! │ Scenario                       │   │ RelaySession                   │
//! │  ├─ phase 1: launch relay ─────┼──►│  ├─ connect()    (EventSource) │
//! │  │    wait for `ready` (30s)   │   │  ├─ subscribe(topic, target)   │
//! │  ├─ phase 2: run trigger cmd   │   │  │    └─► send `ready`         │
//! │  │    settle delay (10s)       │   │  ├─ arm dead-man timer (90s)   │
//! │  └─ phase 3: collect events    │   │  └─ per event:                 │
//! │       until target or 60s      │   │       count += 1               │
//! │                                │   │       send `event{count}`      │
//! │ HarnessSession                 │   │       at target:               │
//! │  ├─ `ready` latch (once)       │   │         send `done{count}`     │
//! │  ├─ ordered event log          │   │         exit 0                 │
//! │  └─ `done` cross-validation    │   │                                │
//! └───────────────▲────────────────┘   └───────────────┬────────────────┘
//!                 │     stdout: one JSON message per line               │
//!                 └──────────────────────────────────────◄──────────────┘
//! ```
//!
//! Message delivery is best-effort: a failed send is dropped with a warning
//! and never alters the relay's own state machine. Human-readable logging
//! goes to stderr so the channel stays parseable.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use relayvisor::ipc::RecordingSink;
//! use relayvisor::relay::{RelayConfig, RelayOutcome, RelaySession};
//! use relayvisor::source::{Credentials, Script, ScriptedSource};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials {
//!         access_token: "token".into(),
//!         instance_url: "https://bus.example".into(),
//!         organization_id: "org".into(),
//!     };
//!     let mut source =
//!         ScriptedSource::new(credentials, Script::events(3, Duration::from_millis(1)));
//!     let mut sink = RecordingSink::new();
//!
//!     let session = RelaySession::new(&RelayConfig::default());
//!     let outcome = session
//!         .run(&mut source, &mut sink, CancellationToken::new())
//!         .await?;
//!
//!     assert_eq!(outcome, RelayOutcome::TargetReached { count: 3 });
//!     // ready + three events + done
//!     assert_eq!(sink.messages().len(), 5);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod harness;
pub mod ipc;
pub mod relay;
pub mod source;

pub use error::{HarnessError, RelayError};
pub use harness::{HarnessConfig, HarnessSession, Scenario, Verdict};
pub use ipc::{Message, MessageSink, SendOutcome};
pub use relay::{RelayConfig, RelayOutcome, RelaySession};
pub use source::{Credentials, EventSource, Script, ScriptedSource, SourceSignal};
