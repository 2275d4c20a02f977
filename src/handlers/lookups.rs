//! Categories and sellers: name-keyed lists with soft delete.

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get},
    Router,
};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response},
    models::{ListFilter, NewCategory, NewSeller},
    AppState,
};

pub fn lookup_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", delete(delete_category))
        .route("/sellers", get(list_sellers).post(create_seller))
        .route("/sellers/:id", delete(delete_seller))
}

async fn list_categories(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.categories.list(&filter).await?;
    Ok(success_response(categories))
}

async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<NewCategory>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.categories.add_category(payload).await?;
    Ok(created_response(category))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.categories.remove(id).await?;
    Ok(no_content_response())
}

async fn list_sellers(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let sellers = state.services.sellers.list(&filter).await?;
    Ok(success_response(sellers))
}

async fn create_seller(
    State(state): State<AppState>,
    Json(payload): Json<NewSeller>,
) -> Result<impl IntoResponse, ServiceError> {
    let seller = state.services.sellers.add_seller(payload).await?;
    Ok(created_response(seller))
}

async fn delete_seller(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.sellers.remove(id).await?;
    Ok(no_content_response())
}
