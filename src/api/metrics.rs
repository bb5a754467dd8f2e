use axum::{extract::State, response::IntoResponse};

use crate::api::AppState;

/// Prometheus metrics endpoint
///
/// Renders the recorder installed in `main`. When no recorder is
/// installed (tests build the router without one) only the info line
/// is reported.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let info = format!(
        "# HELP serverpulse_info ServerPulse backend info\n\
         # TYPE serverpulse_info gauge\n\
         serverpulse_info{{version=\"{}\"}} 1\n",
        env!("CARGO_PKG_VERSION")
    );

    let body = match &state.metrics {
        Some(handle) => format!("{info}{}", handle.render()),
        None => info,
    };

    ([("content-type", "text/plain; charset=utf-8")], body)
}
