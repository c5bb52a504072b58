//! Consumption Loop
//!
//! Owns the connect → receive → persist → reconnect cycle. The loop never
//! gives up on the endpoint by itself: connection and receive failures tear
//! the session down and a new one is opened after the backoff delay. Only a
//! shutdown request (or the `stop` idle policy, which raises one) ends it.
//!
//! ```text
//! Disconnected ──► Connecting ──► Receiving ──┐
//!      ▲               │              ▲  │    │ message / transient empty
//!      └── backoff ◄───┘              │  │    ▼
//!      └───────────── error ◄─────────┘  └── Receiving
//! any state + shutdown ──► Stopped
//! ```

mod runner;
mod settings;
mod state;
mod stats;

pub use runner::ConsumptionLoop;
pub use settings::{ConsumerSettings, DEFAULT_RECEIVE_GRACE};
pub use state::{ConsumerState, IdlePolicy};
pub use stats::ConsumerReport;

#[cfg(test)]
mod tests;
