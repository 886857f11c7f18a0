//! # sotto-client
//!
//! Client-side core of the bifurcated chat system.  A single logical
//! "send" or "load conversation" actually spans two stores -- the vault
//! (encrypted message bodies) and the chat server's pointer index (routing
//! metadata) -- and the [`Coordinator`] is what isolates the rest of an
//! application from that split.
//!
//! [`accounts`] carries the surrounding identity flows: registration,
//! login, and contact listing.

pub mod accounts;
pub mod content;
pub mod coordinator;
pub mod server_api;

mod error;

pub use accounts::{list_contacts, login, register, Session};
pub use content::{ContentStore, DocumentRef, VaultContentStore};
pub use coordinator::Coordinator;
pub use error::{AccountError, CoordinatorError};
pub use server_api::{ApiError, HttpChatServer, PointerApi};
