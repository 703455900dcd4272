/// Health check endpoints
///
/// # Endpoints
///
/// ```text
/// GET /healthz
/// GET /api
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "OK",
///   "data": { "status": "healthy", "version": "0.1.0", "database": "connected" }
/// }
/// ```

use crate::{app::AppState, error::ApiResult, routes::response::ApiResponse};
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Store status
    pub database: String,
}

/// Health check handler
///
/// Probes the store; a failed probe reports `degraded` rather than an error
/// so load balancers still get a body.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<ApiResponse> {
    let database_status = match state.store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(backend = state.store.backend(), "Store health check failed: {}", e);
            "disconnected"
        }
    };

    let health = HealthResponse {
        status: if database_status == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database_status.to_string(),
    };

    Ok(ApiResponse::ok("OK", json!(health)))
}

/// API root: reports that the server is up and for how long
pub async fn api_root(State(state): State<AppState>) -> ApiResponse {
    ApiResponse::ok(
        "Taskboard API is running",
        json!({ "uptime": state.started_at.elapsed().as_secs() }),
    )
}
