//! # sotto-shared
//!
//! Types shared between the sotto client and server: opaque identifiers,
//! the wire protocol for the chat API, and the core configuration object.
//!
//! Message *content* never appears in any of these types.  Everything here
//! is routing metadata: who sent a message, to whom, when, and where in the
//! vault its body lives.

pub mod config;
pub mod protocol;
pub mod types;

pub use config::CoreConfig;
pub use protocol::{ChatMessage, CreatePointerRequest, ListMessagesResponse, MessagePointer};
pub use types::{ContainerId, DocumentId, UserId};
