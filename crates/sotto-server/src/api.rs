use std::sync::{Arc, Mutex};

use axum::extract::{Extension, Path, State};
use axum::http::{Method, StatusCode};
use axum::routing::get;
use axum::{middleware, Json, Router};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use sotto_index::Database;
use sotto_shared::protocol::{CreatePointerRequest, ListMessagesResponse, MessagePointer};
use sotto_shared::types::UserId;

use crate::auth::{auth_middleware, AuthContext};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<Mutex<Database>>,
    pub config: Arc<ServerConfig>,
    pub notifier: Arc<Notifier>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    // Chat routes sit behind the auth gate; /health does not.
    let chat = Router::new()
        .route(
            "/chat/{user_id}/messages",
            get(list_messages).post(create_message),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(chat)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /chat/{user_id}/messages`
///
/// All pointers between the caller and `{user_id}`, ascending by creation
/// time.  The caller's side of the pair comes from the verified credential,
/// never from a request parameter.
async fn list_messages(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(other_user_id): Path<String>,
) -> Result<Json<ListMessagesResponse>, ServerError> {
    let other = UserId::new(other_user_id);
    info!(me = %ctx.user.id, other = %other, "listing conversation");

    let index = state
        .index
        .lock()
        .map_err(|e| ServerError::Internal(format!("Lock poisoned: {e}")))?;
    let messages = index.list_conversation(&ctx.user.id, &other)?;

    Ok(Json(ListMessagesResponse { messages }))
}

/// `POST /chat/{user_id}/messages`
///
/// Append a pointer to a message body the caller already wrote to the
/// vault.  The body reference is the only thing this server ever stores;
/// it has no way to read the message itself.
async fn create_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(other_user_id): Path<String>,
    Json(request): Json<CreatePointerRequest>,
) -> Result<StatusCode, ServerError> {
    let to = UserId::new(other_user_id);
    info!(from = %ctx.user.id, to = %to, "appending message pointer");

    let pointer = MessagePointer {
        created_at: Utc::now(),
        from_user_id: ctx.user.id.clone(),
        to_user_id: to.clone(),
        container_id: request.container_id,
        document_id: request.document_id,
    };

    {
        let index = state
            .index
            .lock()
            .map_err(|e| ServerError::Internal(format!("Lock poisoned: {e}")))?;
        if !index.append_pointer(&pointer)? {
            debug!(document = %pointer.document_id, "duplicate pointer ignored (client retry)");
        }
    }

    // Advisory: runs detached, the 201 does not wait for it.
    state
        .notifier
        .dispatch(ctx.vault.clone(), to, ctx.user.id.clone());

    Ok(StatusCode::CREATED)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting chat API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
