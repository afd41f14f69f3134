//! JSON-RPC message model and Content-Length framed transport.
//!
//! Messages are decoded and classified exactly once, at the transport
//! boundary; the rest of the pipeline works with the tagged [`Message`]
//! variants.

mod message;
mod transport;

pub use message::{Message, RequestId};
pub use transport::{MessageReader, MessageWriter};
