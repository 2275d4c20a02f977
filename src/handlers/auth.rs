use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use tracing::{info, warn};

use crate::{
    auth::{AuthError, LoginRequest},
    AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Exchanges the operator credentials for a bearer token
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    match state.auth.login(&payload) {
        Ok(token) => {
            info!(username = %payload.username, "Operator logged in");
            Ok(Json(token))
        }
        Err(e) => {
            warn!(username = %payload.username, "Login failed: {}", e);
            Err(e)
        }
    }
}
