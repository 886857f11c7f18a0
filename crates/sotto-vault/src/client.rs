//! HTTP client for the vault API.
//!
//! One [`VaultClient`] wraps one bearer credential.  The server constructs a
//! short-lived client per request from the caller's delegated credential;
//! the chat client holds one for the session.
//!
//! The multi-get path has a mandatory three-way branch: the batch endpoint
//! is only defined for two or more ids, and the single-document endpoint
//! returns the bare encoded blob rather than a JSON envelope.  Callers get
//! one uniform `get_documents` regardless.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sotto_shared::types::{ContainerId, DocumentId, UserId};

use crate::codec::{decode_document, encode_document};
use crate::error::{AuthError, CodecError, VaultError};
use crate::types::{TwilioCredentials, UserProfile, VaultUser};

/// Typed vault client bound to a single bearer credential.
#[derive(Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

// ---------------------------------------------------------------------------
// Wire shapes (private -- the vault's JSON, not ours)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    not_valid_after: String,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: WireUser,
}

#[derive(Deserialize)]
struct UserListEnvelope {
    users: Vec<WireUser>,
}

#[derive(Deserialize)]
struct WireUser {
    id: String,
    username: String,
    access_token: Option<String>,
    /// Encoded profile document; present on "full" reads.
    attributes: Option<String>,
}

impl WireUser {
    fn into_user(self) -> Result<VaultUser, CodecError> {
        let profile = match self.attributes {
            Some(ref encoded) => Some(decode_document::<UserProfile>(encoded)?),
            None => None,
        };
        Ok(VaultUser {
            id: UserId::new(self.id),
            username: self.username,
            access_token: self.access_token,
            profile,
        })
    }
}

#[derive(Serialize)]
struct CreateUserRequest<'a> {
    username: &'a str,
    password: &'a str,
    attributes: String,
    group_ids: String,
}

#[derive(Serialize)]
struct CreateDocumentRequest {
    document: String,
}

#[derive(Deserialize)]
struct CreateDocumentResponse {
    document_id: String,
}

#[derive(Deserialize)]
struct MultigetResponse {
    documents: Vec<WireDocument>,
}

#[derive(Deserialize)]
struct WireDocument {
    id: String,
    document: String,
}

#[derive(Serialize)]
struct SmsRequest<'a> {
    account_sid: &'a str,
    key_sid: &'a str,
    key_secret: &'a str,
    user_id: &'a str,
    from_number: SmsSource<'a>,
    to_number: SmsSource<'a>,
    message_body: &'a str,
}

/// Either a literal value or an attribute of the addressed user, resolved
/// inside the vault so the phone number never transits this process.
#[derive(Serialize)]
enum SmsSource<'a> {
    #[serde(rename = "literal_value")]
    Literal(&'a str),
    #[serde(rename = "user_attribute")]
    UserAttribute(&'a str),
}

/// Error envelope the vault attaches to non-success responses.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl VaultClient {
    /// Create a client for `endpoint` authorized by `token`.
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            endpoint,
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    /// Exchange username/password for an identity and a fresh access token.
    ///
    /// `not_valid_after` bounds the token lifetime.
    pub async fn login(
        endpoint: &str,
        username: &str,
        password: &str,
        not_valid_after: DateTime<Utc>,
    ) -> Result<VaultUser, AuthError> {
        let endpoint = endpoint.trim_end_matches('/');
        let response = reqwest::Client::new()
            .post(format!("{endpoint}/v1/auth/login"))
            .json(&LoginRequest {
                username,
                password,
                not_valid_after: not_valid_after.to_rfc3339(),
            })
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        Self::identity_from_response(response).await
    }

    /// Resolve the identity behind this client's credential.
    ///
    /// This is the authentication gate: a rejected credential means the
    /// caller is not who they claim and the request must stop here.
    pub async fn current_user(&self) -> Result<VaultUser, AuthError> {
        let response = self
            .http
            .get(self.url("v1/auth/me"))
            .query(&[("full", "true")])
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        Self::identity_from_response(response).await
    }

    async fn identity_from_response(response: reqwest::Response) -> Result<VaultUser, AuthError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::Invalid);
        }
        if !status.is_success() {
            return Err(AuthError::Transport(format!(
                "identity provider returned {status}"
            )));
        }

        let envelope: UserEnvelope = response
            .json()
            .await
            .map_err(|e| AuthError::Transport(format!("malformed identity response: {e}")))?;

        envelope
            .user
            .into_user()
            .map_err(|e| AuthError::Transport(format!("malformed identity attributes: {e}")))
    }

    /// Create a user with an encoded profile document and group grants.
    ///
    /// Authorized by whatever credential this client holds -- for
    /// registration that is the shared service credential, never an end
    /// user's token.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        profile: &UserProfile,
        group_ids: &[uuid::Uuid],
    ) -> Result<VaultUser, VaultError> {
        let group_ids = group_ids
            .iter()
            .map(|g| g.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let response = self
            .http
            .post(self.url("v1/users"))
            .query(&[("full", "true")])
            .bearer_auth(&self.token)
            .json(&CreateUserRequest {
                username,
                password,
                attributes: encode_document(profile)?,
                group_ids,
            })
            .send()
            .await?;

        let envelope: UserEnvelope = Self::json_or_error(response).await?;
        Ok(envelope.user.into_user()?)
    }

    /// List all users with decoded profile attributes.
    pub async fn list_users(&self) -> Result<Vec<VaultUser>, VaultError> {
        let response = self
            .http
            .get(self.url("v1/users"))
            .query(&[("full", "true")])
            .bearer_auth(&self.token)
            .send()
            .await?;

        let envelope: UserListEnvelope = Self::json_or_error(response).await?;
        envelope
            .users
            .into_iter()
            .map(|u| u.into_user().map_err(VaultError::from))
            .collect()
    }

    /// Write one document and return its vault-assigned id.
    pub async fn create_document<T: Serialize>(
        &self,
        container: &ContainerId,
        payload: &T,
    ) -> Result<DocumentId, VaultError> {
        let response = self
            .http
            .post(self.url(&format!("v1/vaults/{container}/documents")))
            .bearer_auth(&self.token)
            .json(&CreateDocumentRequest {
                document: encode_document(payload)?,
            })
            .send()
            .await?;

        let created: CreateDocumentResponse = Self::json_or_error(response).await?;
        DocumentId::parse(&created.document_id)
            .map_err(|e| VaultError::Malformed(format!("bad document id: {e}")))
    }

    /// Fetch one document.  The single-document endpoint returns the bare
    /// encoded blob, not a JSON envelope.
    pub async fn get_document<T: DeserializeOwned>(
        &self,
        container: &ContainerId,
        id: &DocumentId,
    ) -> Result<T, VaultError> {
        let response = self
            .http
            .get(self.url(&format!("v1/vaults/{container}/documents/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let encoded = response.text().await?;
        Ok(decode_document(&encoded)?)
    }

    /// Fetch a set of documents, keyed by id.
    ///
    /// Empty set: no network call.  One id: single-document endpoint.  Two
    /// or more: the batch endpoint (comma-joined ids).  The branch is part
    /// of the vault's contract -- the batch endpoint is not defined for
    /// fewer than two ids.
    pub async fn get_documents<T: DeserializeOwned>(
        &self,
        container: &ContainerId,
        ids: &[DocumentId],
    ) -> Result<HashMap<DocumentId, T>, VaultError> {
        match ids {
            [] => Ok(HashMap::new()),
            [id] => {
                let payload = self.get_document(container, id).await?;
                Ok(HashMap::from([(*id, payload)]))
            }
            many => {
                debug!(count = many.len(), "batch document fetch");
                let joined = many
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(",");

                let response = self
                    .http
                    .get(self.url(&format!("v1/vaults/{container}/documents/{joined}")))
                    .bearer_auth(&self.token)
                    .send()
                    .await?;

                let batch: MultigetResponse = Self::json_or_error(response).await?;
                let mut documents = HashMap::with_capacity(batch.documents.len());
                for doc in batch.documents {
                    let id = DocumentId::parse(&doc.id)
                        .map_err(|e| VaultError::Malformed(format!("bad document id: {e}")))?;
                    documents.insert(id, decode_document(&doc.document)?);
                }
                Ok(documents)
            }
        }
    }

    /// Send an SMS through the vault's Twilio passthrough.
    ///
    /// The destination is the recipient's `phoneNumber` profile attribute,
    /// resolved inside the vault: the number itself never reaches the
    /// caller.
    pub async fn send_sms_twilio(
        &self,
        credentials: &TwilioCredentials,
        recipient: &UserId,
        from_number: &str,
        message_body: &str,
    ) -> Result<(), VaultError> {
        let response = self
            .http
            .post(self.url("v1/sms/twilio"))
            .bearer_auth(&self.token)
            .json(&SmsRequest {
                account_sid: &credentials.account_sid,
                key_sid: &credentials.key_sid,
                key_secret: &credentials.key_secret,
                user_id: recipient.as_str(),
                from_number: SmsSource::Literal(from_number),
                to_number: SmsSource::UserAttribute("phoneNumber"),
                message_body,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(())
    }

    async fn json_or_error<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, VaultError> {
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn api_error(response: reqwest::Response) -> VaultError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => envelope.error.message,
            Err(_) => body,
        };
        VaultError::Api { status, message }
    }
}
