use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde_json::Value;

use crate::{
    errors::ServiceError,
    handlers::common::{no_content_response, success_response},
    AppState,
};

pub fn draft_routes() -> Router<AppState> {
    Router::new().route(
        "/drafts/:form",
        get(load_draft).put(save_draft).delete(discard_draft),
    )
}

async fn load_draft(
    State(state): State<AppState>,
    Path(form): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let draft = state
        .drafts
        .load(&form)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("No draft saved for {}", form)))?;
    Ok(success_response(draft))
}

/// Accepted immediately; the write happens after the autosave delay.
async fn save_draft(
    State(state): State<AppState>,
    Path(form): Path<String>,
    Json(draft): Json<Value>,
) -> Result<impl IntoResponse, ServiceError> {
    state.drafts.update(&form, draft)?;
    Ok(no_content_response())
}

async fn discard_draft(
    State(state): State<AppState>,
    Path(form): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.drafts.discard(&form).await?;
    Ok(no_content_response())
}
