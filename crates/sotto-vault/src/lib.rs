//! # sotto-vault
//!
//! Typed client for the vault: the external service that stores encrypted
//! documents (message bodies, user profiles) and doubles as the identity
//! provider.  Everything sensitive lives behind this boundary; the rest of
//! the workspace only ever holds opaque document references.
//!
//! The vault transports documents as base64-encoded JSON.  This crate owns
//! that codec and decodes payloads into per-use-site types
//! ([`MessageBody`], [`UserProfile`]) so malformed documents fail at the
//! boundary rather than somewhere downstream.

pub mod client;
pub mod codec;
pub mod types;

mod error;

pub use client::VaultClient;
pub use error::{AuthError, CodecError, VaultError};
pub use types::{MessageBody, TwilioCredentials, UserProfile, VaultUser};
