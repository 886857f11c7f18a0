//! Typed payloads and identity types for the vault boundary.

use serde::{Deserialize, Serialize};

use sotto_shared::types::UserId;

/// Payload of a chat-message document.
///
/// `deny_unknown_fields` makes the codec reject documents that are not
/// actually message bodies instead of silently coercing them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MessageBody {
    pub message: String,
}

/// Payload of a user-profile document (the user's encrypted attributes).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Destination for SMS notifications.  Only the vault ever resolves
    /// this; the chat server addresses recipients by user id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// An identity as reported by the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultUser {
    pub id: UserId,
    pub username: String,
    /// Present after login and registration; absent on plain user reads.
    pub access_token: Option<String>,
    /// Decoded profile attributes when the caller asked for a full user.
    pub profile: Option<UserProfile>,
}

/// Credentials for the vault's Twilio SMS passthrough.
///
/// These authorize the vault to send on the application's behalf.  They are
/// server-side configuration and never reach clients.
#[derive(Debug, Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub key_sid: String,
    pub key_secret: String,
}
