//! Wire protocol of the chat API.
//!
//! A [`MessagePointer`] is what the index stores and the server returns:
//! routing metadata plus a reference into the vault, never message text.
//! A [`ChatMessage`] is the ephemeral join of a pointer with its vault
//! document, materialized by the client on every read and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ContainerId, DocumentId, UserId};

/// One index entry.  Immutable once written; uniquely identified by
/// `(container_id, document_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessagePointer {
    /// When the pointer was appended (assigned by the server).
    pub created_at: DateTime<Utc>,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    /// Vault container holding the message body.  Kept per-row even though
    /// a deployment uses a single container, so that a multi-container
    /// migration never requires a schema change.
    pub container_id: ContainerId,
    pub document_id: DocumentId,
}

/// A fully materialized chat message as the application sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// The vault document id doubles as the message id.
    pub id: DocumentId,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Response body of `GET /chat/{userId}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessagePointer>,
}

/// Request body of `POST /chat/{userId}/messages`.
///
/// The caller has already written the message body to the vault; this only
/// carries the reference.  Sender identity comes from the credential, the
/// recipient from the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePointerRequest {
    pub container_id: ContainerId,
    pub document_id: DocumentId,
}
