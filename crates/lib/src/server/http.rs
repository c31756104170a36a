//! HTTP routes for the local backend.

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::store::SessionStore;
use crate::backend::{ChannelActivated, ChannelRequest, ChatReply, ChatRequest, ErrorBody};
use crate::config::ServerConfig;

#[derive(Clone)]
struct ServerState {
    store: SessionStore,
    port: u16,
}

/// Error response: status plus `{ "detail": "..." }`.
struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: Some(self.1),
        };
        (self.0, Json(body)).into_response()
    }
}

/// Build the router. `port` is reported by the health endpoint.
pub fn router(store: SessionStore, port: u16) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/api/channel", post(process_channel))
        .route("/api/chat/:session_id", post(chat))
        .with_state(ServerState { store, port })
}

/// Serve on an already-bound listener until `shutdown` completes.
pub async fn serve(
    listener: tokio::net::TcpListener,
    store: SessionStore,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let port = listener.local_addr().context("reading local address")?.port();
    axum::serve(listener, router(store, port))
        .with_graceful_shutdown(shutdown)
        .await
        .context("server exited")
}

/// Run the local backend on `config.bind:config.port` until Ctrl+C or SIGTERM.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("backend listening on {}", bind_addr);
    serve(listener, SessionStore::new(), shutdown_signal()).await?;
    log::info!("backend stopped");
    Ok(())
}

/// Completes on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

async fn health_http(State(state): State<ServerState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.port,
    }))
}

/// POST /api/channel — create a session bound to the channel.
async fn process_channel(
    State(state): State<ServerState>,
    Json(req): Json<ChannelRequest>,
) -> Result<Json<ChannelActivated>, ApiError> {
    let name = req.channel_name.trim();
    if name.is_empty() {
        return Err(ApiError(
            StatusCode::BAD_REQUEST,
            "channel_name is required".to_string(),
        ));
    }
    let session_id = state.store.create(name).await;
    log::info!("channel {:?} bound to {}", name, session_id);
    Ok(Json(ChannelActivated { session_id }))
}

/// POST /api/chat/:session_id — echo the message tagged with the channel name.
async fn chat(
    State(state): State<ServerState>,
    Path(session_id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let Some(session) = state.store.get(&session_id).await else {
        return Err(ApiError(
            StatusCode::NOT_FOUND,
            "Session not found".to_string(),
        ));
    };
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError(
            StatusCode::BAD_REQUEST,
            "message is required".to_string(),
        ));
    }
    let response = format!("[{}] {}", session.channel_name, message);
    state
        .store
        .record_turn(&session_id, message, response.clone())
        .await
        .map_err(|e| ApiError(StatusCode::NOT_FOUND, e))?;
    log::debug!("session {}: {} turn(s)", session_id, session.history.len() + 1);
    Ok(Json(ChatReply {
        response: Some(response),
    }))
}
