//! Queue Session
//!
//! The transport side of the listener. A [`QueueSource`] knows how to reach
//! the broker and hands out one [`QueueSession`] per successful connection.
//! A session owns every connection handle it holds; closing it (or dropping
//! it) releases them, and sessions are never shared or reused.
//!
//! Each `receive` call waits at most the given timeout and reports exactly
//! one [`ReceiveOutcome`]:
//!
//! | Outcome | Meaning | Consumer reaction |
//! |---|---|---|
//! | `Message` | a payload arrived | sanitize, persist, settle |
//! | `Empty` | the full wait passed without a message | idle policy |
//! | `TransientEmpty` | broker reported "nothing right now" | wait again |
//! | `Error` | anything else | tear the session down |
//!
//! The shipped transport is NATS JetStream ([`NatsQueueSource`]).

mod config;
mod error;
mod message;
mod nats;
mod traits;

pub use config::{Credentials, EndpointConfig};
pub use error::{ConnectError, ReceiveError};
pub use message::{RawMessage, ReceiveOutcome};
pub use nats::{NatsQueueSource, NatsSession};
pub use traits::{QueueSession, QueueSource};

#[cfg(test)]
pub(crate) mod testing;
