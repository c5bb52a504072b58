//! Document Writer
//!
//! Wraps each cleaned message in a small XML document and stores it as
//! `message_<timestamp>.xml` in the output directory.
//!
//! ```text
//! <?xml version='1.0' encoding='utf-8'?>
//! <MQMessage><Timestamp>20240309T140507Z</Timestamp><QueueName>ORDERS.IN</QueueName>
//!   <MessageType>Text</MessageType><Content>...</Content></MQMessage>
//! ```
//!
//! Names carry second precision only, so two messages persisted within the
//! same second share a file name and the later one replaces the earlier.

mod error;
mod model;
mod sink;
mod writer;

pub use error::{DocumentParseError, PersistError};
pub use model::{format_timestamp, PersistedDocument, ROOT_ELEMENT, TIMESTAMP_FORMAT};
pub use sink::{DocumentSink, FsDocumentSink, WriteReceipt};
pub use writer::{DocumentWriter, MessageMetadata, TEXT_MESSAGE_TYPE};

#[cfg(test)]
pub(crate) use sink::testing;
