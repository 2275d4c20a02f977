use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub storage: &'static str,
    pub draft_autosave: bool,
    pub timestamp: String,
}

/// Public health routes
///
/// - GET /health       - liveness, always 200 while the process serves
/// - GET /health/ready - 503 when the database does not answer
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(liveness_check))
        .route("/health/ready", get(readiness_check))
}

fn storage_kind(state: &AppState) -> &'static str {
    if state.database.is_some() {
        "database"
    } else {
        "local"
    }
}

async fn liveness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthStatus {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        storage: storage_kind(&state),
        draft_autosave: state.drafts.is_running(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let database_ok = match &state.database {
        Some(pool) => match crate::db::check_connection(pool).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Readiness check failed: {}", e);
                false
            }
        },
        None => true,
    };

    let status_code = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthStatus {
        status: if database_ok { "ready" } else { "unavailable" },
        version: env!("CARGO_PKG_VERSION"),
        storage: storage_kind(&state),
        draft_autosave: state.drafts.is_running(),
        timestamp: Utc::now().to_rfc3339(),
    };
    (status_code, Json(body))
}
