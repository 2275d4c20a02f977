use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get},
    Router,
};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    handlers::common::{no_content_response, success_response},
    models::{ListFilter, NewGoal},
    AppState,
};

pub fn goal_routes() -> Router<AppState> {
    Router::new()
        .route("/goals", get(list_goals).put(save_goal))
        .route("/goals/progress", get(goal_progress))
        .route("/goals/:id", delete(delete_goal))
}

async fn list_goals(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let goals = state.services.goals.list(&filter).await?;
    Ok(success_response(goals))
}

/// Upsert keyed by seller, month and year
async fn save_goal(
    State(state): State<AppState>,
    Json(payload): Json<NewGoal>,
) -> Result<impl IntoResponse, ServiceError> {
    let goal = state.services.goals.set_goal(payload).await?;
    Ok(success_response(goal))
}

async fn goal_progress(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.goals.progress()))
}

async fn delete_goal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.goals.remove_goal(id).await?;
    Ok(no_content_response())
}
