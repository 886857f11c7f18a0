use thiserror::Error;

use sotto_shared::types::DocumentId;
use sotto_vault::{AuthError, VaultError};

use crate::server_api::ApiError;

/// Errors from the send/read protocols.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// Content-store failure.  During a send this means nothing was
    /// written; during a read it means the fetch step failed.
    #[error("Content store error: {0}")]
    ContentStore(#[from] VaultError),

    /// Pointer-index failure.  During a send this arrives *after* the
    /// content write: the body exists as an invisible orphan, and retrying
    /// the whole send is safe.
    #[error("Chat server error: {0}")]
    PointerApi(#[from] ApiError),

    /// A pointer referenced a document that a *successful* content fetch
    /// did not return.  This signals a broken invariant (store-side data
    /// loss or an orphaned-write race), and must never be confused with an
    /// empty conversation.
    #[error("Conversation integrity fault: no content for document {document_id}")]
    JoinIntegrity { document_id: DocumentId },
}

/// Errors from the account flows (registration, login).
#[derive(Error, Debug)]
pub enum AccountError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Vault(#[from] VaultError),
}
