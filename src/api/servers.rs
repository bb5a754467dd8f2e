//! Server status listing
//!
//! The HTTP counterpart of the bot's `/servers` command, gated by the
//! same shared token via a bearer Authorization header.

use axum::{extract::State, http::HeaderMap};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::response::ApiResponse;
use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::liveness::ServerStatus;

#[derive(Debug, Serialize, ToSchema)]
pub struct ServerListResponse {
    /// Known servers in first-seen order.
    pub servers: Vec<ServerStatus>,
    pub total: usize,
}

/// List known servers with their activity status
#[utoipa::path(
    get,
    path = "/api/servers",
    tag = "servers",
    responses(
        (status = 200, description = "Known servers in first-seen order", body = ServerListResponse),
        (status = 403, description = "Invalid or missing token"),
    )
)]
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<ApiResponse<ServerListResponse>> {
    authorize(&state, &headers)?;

    let servers = state.store.snapshot(state.config.activity_window()).await;
    let total = servers.len();

    Ok(ApiResponse::success(ServerListResponse { servers, total }))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> AppResult<()> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Forbidden("missing bearer token".to_string()))?;

    if token != *state.secret {
        return Err(AppError::Forbidden("invalid token".to_string()));
    }
    Ok(())
}
