use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize, ToSchema)]
pub struct MonitorStatusResponse {
    pub known_servers: usize,
    pub registered_users: usize,
    pub bot_configured: bool,
    pub activity_window_secs: u64,
    pub sweep_interval_secs: u64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "monitor",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get monitor configuration and counters
#[utoipa::path(
    get,
    path = "/api/monitor/status",
    tag = "monitor",
    responses(
        (status = 200, description = "Monitor status", body = MonitorStatusResponse),
    )
)]
pub async fn monitor_status(State(state): State<AppState>) -> Json<MonitorStatusResponse> {
    Json(MonitorStatusResponse {
        known_servers: state.store.len().await,
        registered_users: state.users.len().await,
        bot_configured: state.config.bot_token.is_some(),
        activity_window_secs: state.config.activity_window_secs,
        sweep_interval_secs: state.config.sweep_interval_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await;
        assert_eq!(response.status, "ok");
    }
}
