//! OpenAPI documentation for the ServerPulse API
//!
//! This module provides Swagger/OpenAPI documentation for all API endpoints.

use utoipa::OpenApi;

/// API Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ServerPulse API",
        version = "1.0.0",
        description = "Server liveness monitor.\n\n## Features\n- Collect heartbeats from a fleet of servers\n- Track active/inactive status per server\n- Notify registered Telegram users on discovery, inactivity and reactivation",
        license(name = "MIT"),
        contact(name = "ServerPulse Team")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "heartbeat", description = "Heartbeat intake from monitored servers"),
        (name = "servers", description = "Known servers and their liveness status"),
        (name = "monitor", description = "Service health and monitor configuration")
    ),
    paths(
        crate::api::heartbeat::report,
        crate::api::servers::list,
        crate::api::health::health_check,
        crate::api::health::monitor_status,
    ),
    components(schemas(
        crate::api::heartbeat::HeartbeatRequest,
        crate::api::heartbeat::HeartbeatResponse,
        crate::api::servers::ServerListResponse,
        crate::api::health::HealthResponse,
        crate::api::health::MonitorStatusResponse,
        crate::liveness::ServerStatus,
        crate::api::response::ApiError,
    ))
)]
pub struct ApiDoc;
