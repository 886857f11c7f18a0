use thiserror::Error;

/// Errors from the identity side of the vault (login, current-user).
///
/// Authentication is a synchronous gate: callers never retry, they abort
/// the request.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The provider rejected the credential (invalid or expired).
    #[error("Credential rejected by the identity provider")]
    Invalid,

    /// The provider could not be reached, or answered with something that
    /// is not a valid identity response.
    #[error("Identity provider failure: {0}")]
    Transport(String),
}

/// Errors from the document side of the vault.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Network-level failure talking to the vault.
    #[error("Vault request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The vault answered with a non-success status.  `message` carries the
    /// vault's error envelope text when one was present.
    #[error("Vault returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Document transport encoding failure (base64 / JSON).
    #[error("Document codec error: {0}")]
    Codec(#[from] CodecError),

    /// The response did not have the promised shape.
    #[error("Malformed vault response: {0}")]
    Malformed(String),
}

/// Failure encoding or decoding the base64-JSON document transport.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
}
