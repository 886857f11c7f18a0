//! Bearer-credential authentication middleware.
//!
//! Every chat route requires a vault access token in the `Authorization`
//! header.  The middleware exchanges it with the identity provider for the
//! caller's verified identity and attaches that identity -- together with a
//! vault client delegated from the same credential -- to the request, so
//! downstream vault calls are authorized as the caller.
//!
//! Authentication is a synchronous gate: any failure ends the request with
//! `401` before a single byte of state is touched.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tracing::error;

use sotto_vault::{AuthError, VaultClient, VaultUser};

use crate::api::AppState;
use crate::error::ServerError;

/// Verified caller identity plus a vault client holding the caller's own
/// (delegated) credential.
#[derive(Clone)]
pub struct AuthContext {
    pub user: VaultUser,
    pub vault: VaultClient,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(token) = bearer_token(req.headers()) else {
        return Err(ServerError::Unauthorized);
    };

    let vault = VaultClient::new(&state.config.vault_endpoint, token);
    let user = match vault.current_user().await {
        Ok(user) => user,
        Err(AuthError::Invalid) => return Err(ServerError::Unauthorized),
        Err(AuthError::Transport(message)) => {
            // Operators need to tell provider outages apart from bad
            // credentials, the caller does not.
            error!(error = %message, "identity provider failure during auth");
            return Err(ServerError::Unauthorized);
        }
    };

    req.extensions_mut().insert(AuthContext { user, vault });
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
