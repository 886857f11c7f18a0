//! Pointer-index seam: the chat server's HTTP API.
//!
//! The server derives the caller's side of every conversation from the
//! bearer credential, so the API surface only ever names the *other*
//! party.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use sotto_shared::protocol::{CreatePointerRequest, ListMessagesResponse, MessagePointer};
use sotto_shared::types::UserId;

use crate::content::DocumentRef;

/// Errors talking to the chat server.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Chat server request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Credential rejected by the chat server")]
    Unauthorized,

    #[error("Chat server returned {0}")]
    Status(StatusCode),
}

/// Pointer operations against the message index.
#[async_trait]
pub trait PointerApi: Send + Sync {
    /// All pointers between the caller and `other`, ascending by creation
    /// time.
    async fn list_conversation(&self, other: &UserId) -> Result<Vec<MessagePointer>, ApiError>;

    /// Append a pointer for a message the caller sent to `other`.  The
    /// referenced document must already be durable.
    async fn append_pointer(&self, to: &UserId, document: &DocumentRef) -> Result<(), ApiError>;
}

/// Production pointer API over HTTP.
pub struct HttpChatServer {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpChatServer {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            endpoint,
            token: token.into(),
        }
    }

    fn messages_url(&self, other: &UserId) -> String {
        format!("{}/chat/{}/messages", self.endpoint, other)
    }
}

#[async_trait]
impl PointerApi for HttpChatServer {
    async fn list_conversation(&self, other: &UserId) -> Result<Vec<MessagePointer>, ApiError> {
        let response = self
            .http
            .get(self.messages_url(other))
            .bearer_auth(&self.token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            status if !status.is_success() => Err(ApiError::Status(status)),
            _ => {
                let body: ListMessagesResponse = response.json().await?;
                Ok(body.messages)
            }
        }
    }

    async fn append_pointer(&self, to: &UserId, document: &DocumentRef) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.messages_url(to))
            .bearer_auth(&self.token)
            .json(&CreatePointerRequest {
                container_id: document.container_id,
                document_id: document.document_id,
            })
            .send()
            .await?;

        // The append contract is exactly 201; anything else means the
        // pointer cannot be assumed to exist.
        match response.status() {
            StatusCode::CREATED => Ok(()),
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            status => Err(ApiError::Status(status)),
        }
    }
}
