//! Base64-JSON document transport codec.
//!
//! The vault stores documents as opaque encoded blobs; it never sees JSON.
//! Encoding is `base64(json(payload))`, decoding the reverse.  Payload
//! types are chosen per use site so a profile document can never be
//! mistaken for a message body.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

/// Encode a document payload into the vault's transport form.
pub fn encode_document<T: Serialize>(payload: &T) -> Result<String, CodecError> {
    let json = serde_json::to_vec(payload)?;
    Ok(STANDARD.encode(json))
}

/// Decode a document from the vault's transport form into a typed payload.
pub fn decode_document<T: DeserializeOwned>(encoded: &str) -> Result<T, CodecError> {
    let json = STANDARD.decode(encoded.trim())?;
    Ok(serde_json::from_slice(&json)?)
}
