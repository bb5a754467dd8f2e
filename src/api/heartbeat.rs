//! Heartbeat intake
//!
//! Servers POST here periodically to announce they are alive. The
//! reporting identity is the peer's IP address; the body carries only
//! the shared token. Store recording is synchronous, notification
//! dispatch is a non-blocking queue hand-off.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    Json,
};
use metrics::increment_counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::liveness::TransitionKind;
use crate::notify::Notification;

#[derive(Debug, Deserialize, ToSchema)]
pub struct HeartbeatRequest {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HeartbeatResponse {
    pub message: String,
    pub code: u16,
}

/// Record a heartbeat from the calling server
#[utoipa::path(
    post,
    path = "/api/heartbeat",
    tag = "heartbeat",
    request_body = HeartbeatRequest,
    responses(
        (status = 200, description = "Heartbeat recorded", body = HeartbeatResponse),
        (status = 403, description = "Invalid token"),
    )
)]
pub async fn report(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<HeartbeatRequest>,
) -> AppResult<Json<HeartbeatResponse>> {
    if req.token != *state.secret {
        return Err(AppError::Forbidden("invalid token".to_string()));
    }

    let identity = addr.ip().to_string();
    let kind = state.store.record_heartbeat(&identity).await;
    increment_counter!("serverpulse_heartbeats_total", "transition" => kind.to_string());
    debug!(%identity, transition = %kind, "Heartbeat recorded");

    let job = match kind {
        TransitionKind::New => {
            info!(%identity, "New server discovered");
            Some(Notification::Discovered { identity })
        }
        TransitionKind::Reactivated => {
            info!(%identity, "Server active again");
            Some(Notification::Reactivated { identity })
        }
        TransitionKind::Unchanged => None,
    };

    // The store mutation already happened; a full or closed queue only
    // loses the (best-effort) notification.
    if let Some(job) = job {
        if let Err(e) = state.notify_tx.try_send(job) {
            warn!(error = %e, "Failed to enqueue notification");
        }
    }

    Ok(Json(HeartbeatResponse {
        message: "ok".to_string(),
        code: 200,
    }))
}
