//! Content-store seam used by the coordinator.
//!
//! The trait exists so the coordinator's consistency protocol can be
//! exercised against in-memory doubles; [`VaultContentStore`] is the
//! production implementation over a [`VaultClient`] and the configured
//! container.

use std::collections::HashMap;

use async_trait::async_trait;

use sotto_shared::types::{ContainerId, DocumentId};
use sotto_vault::{MessageBody, VaultClient, VaultError};

/// Reference to one stored document: exactly what a message pointer
/// carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentRef {
    pub container_id: ContainerId,
    pub document_id: DocumentId,
}

/// Message-body operations against the content store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Write one message body.  The document must be durable before this
    /// returns: the returned reference is what makes a pointer valid.
    async fn create_message(&self, text: &str) -> Result<DocumentRef, VaultError>;

    /// Fetch the bodies for a set of document ids, keyed by id.  Absent
    /// ids are simply absent from the map; judging that is the caller's
    /// business.
    async fn fetch_messages(
        &self,
        ids: &[DocumentId],
    ) -> Result<HashMap<DocumentId, MessageBody>, VaultError>;
}

/// Production content store: the vault, scoped to one container.
pub struct VaultContentStore {
    client: VaultClient,
    container: ContainerId,
}

impl VaultContentStore {
    pub fn new(client: VaultClient, container: ContainerId) -> Self {
        Self { client, container }
    }
}

#[async_trait]
impl ContentStore for VaultContentStore {
    async fn create_message(&self, text: &str) -> Result<DocumentRef, VaultError> {
        let document_id = self
            .client
            .create_document(
                &self.container,
                &MessageBody {
                    message: text.to_string(),
                },
            )
            .await?;

        Ok(DocumentRef {
            container_id: self.container,
            document_id,
        })
    }

    async fn fetch_messages(
        &self,
        ids: &[DocumentId],
    ) -> Result<HashMap<DocumentId, MessageBody>, VaultError> {
        self.client.get_documents(&self.container, ids).await
    }
}
