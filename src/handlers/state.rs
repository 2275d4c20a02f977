//! Read access to the application state plus the operator's
//! "reload" and "dismiss error" actions.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};

use crate::{
    errors::ServiceError,
    handlers::common::{no_content_response, success_response},
    state::{Collection, StateAction},
    AppState,
};

pub fn state_routes() -> Router<AppState> {
    Router::new()
        .route("/state", get(get_state))
        .route("/state/reload", post(reload_state))
        .route("/state/errors/:collection", delete(clear_error))
}

async fn get_state(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.state.snapshot()))
}

async fn reload_state(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    state.services.load_all().await?;
    Ok(success_response(state.services.state.snapshot()))
}

async fn clear_error(
    State(state): State<AppState>,
    Path(collection): Path<Collection>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .state
        .dispatch(StateAction::ErrorCleared(collection));
    Ok(no_content_response())
}
