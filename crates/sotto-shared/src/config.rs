//! Core configuration shared by the client-side components.
//!
//! The coordinator, the identity flows, and the content-store client are all
//! constructed from one explicit [`CoreConfig`] value.  Nothing in this
//! workspace reads deployment identifiers from globals.

use uuid::Uuid;

use crate::types::ContainerId;

/// Configuration handed to the coordinator and the account flows at
/// construction.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Base URL of the vault service, which doubles as the identity
    /// provider (e.g. `https://api.vault.example`).  Account-scoped; there
    /// is no separate account id.
    pub identity_provider_endpoint: String,

    /// Container holding all message bodies and user profiles for this
    /// deployment.
    pub content_container_id: ContainerId,

    /// Service credential used exclusively for registration-time writes
    /// (creating a user before that user has a credential of their own).
    /// Never used for any other operation.
    pub registration_credential: String,

    /// Groups granted to newly registered users so they can read and write
    /// the content container.
    pub registration_group_ids: Vec<Uuid>,

    /// Base URL of the chat API server that owns the message index.
    pub chat_server_endpoint: String,
}
