//! Account flows surrounding the chat core: registration, login, and
//! contact listing.
//!
//! These are the operations the original sign-in screens drive.  They are
//! deliberately thin: the identity provider does the real work, and a
//! successful flow yields a [`Session`] from which everything else (the
//! coordinator included) is constructed.

use chrono::{Duration, Utc};
use tracing::info;

use sotto_shared::config::CoreConfig;
use sotto_shared::types::UserId;
use sotto_vault::{AuthError, UserProfile, VaultClient, VaultError, VaultUser};

use crate::content::VaultContentStore;
use crate::coordinator::Coordinator;
use crate::error::AccountError;
use crate::server_api::HttpChatServer;

/// Lifetime requested for login tokens.
const TOKEN_LIFETIME_DAYS: i64 = 365;

/// A logged-in identity and its access credential.
///
/// The credential is held for the session only; it is never persisted and
/// never logged.
pub struct Session {
    pub user: VaultUser,
    access_token: String,
}

impl Session {
    fn from_user(user: VaultUser) -> Result<Self, AuthError> {
        let access_token = user
            .access_token
            .clone()
            .ok_or_else(|| AuthError::Transport("identity response carried no access token".to_string()))?;

        Ok(Self { user, access_token })
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    /// Vault client delegated from this session's credential.
    pub fn vault_client(&self, config: &CoreConfig) -> VaultClient {
        VaultClient::new(&config.identity_provider_endpoint, &self.access_token)
    }

    /// Production coordinator wired from the core configuration.
    pub fn coordinator(&self, config: &CoreConfig) -> Coordinator<VaultContentStore, HttpChatServer> {
        let store = VaultContentStore::new(self.vault_client(config), config.content_container_id);
        let api = HttpChatServer::new(&config.chat_server_endpoint, &self.access_token);
        Coordinator::new(self.user.id.clone(), store, api)
    }
}

/// Exchange username/password for a session.
pub async fn login(
    config: &CoreConfig,
    username: &str,
    password: &str,
) -> Result<Session, AuthError> {
    let not_valid_after = Utc::now() + Duration::days(TOKEN_LIFETIME_DAYS);

    let user = VaultClient::login(
        &config.identity_provider_endpoint,
        username,
        password,
        not_valid_after,
    )
    .await?;

    info!(user = %user.id, "logged in");
    Session::from_user(user)
}

/// Create an account and return a session for it.
///
/// The create call is authorized by the shared registration credential --
/// the only operation that credential is ever used for.  The new user gets
/// the configured group grants and an encrypted profile document holding
/// their attributes.
pub async fn register(
    config: &CoreConfig,
    username: &str,
    password: &str,
    profile: &UserProfile,
) -> Result<Session, AccountError> {
    let service = VaultClient::new(
        &config.identity_provider_endpoint,
        &config.registration_credential,
    );

    let user = service
        .create_user(username, password, profile, &config.registration_group_ids)
        .await?;

    info!(user = %user.id, "registered");
    Ok(Session::from_user(user)?)
}

/// All users known to the provider, with decoded profiles -- the contact
/// list's data source.
pub async fn list_contacts(
    config: &CoreConfig,
    session: &Session,
) -> Result<Vec<VaultUser>, VaultError> {
    session.vault_client(config).list_users().await
}
