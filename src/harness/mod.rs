//! The supervisor side: spawn the relay, trigger publication, collect
//! events, adjudicate the verdict.

mod child;
mod config;
mod scenario;
mod session;
mod trigger;

pub use child::{ChildEvent, RelayHandle};
pub use config::HarnessConfig;
pub use scenario::{Scenario, Verdict};
pub use session::{HarnessSession, Observation};
