use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response},
    models::{AdjustStock, NewProduct, ProductChanges, ProductFilter, RegisterLoss},
    AppState,
};

/// Catalogue and stock routes
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", put(update_product).delete(delete_product))
        .route("/products/:id/stock", post(adjust_stock))
        .route("/products/:id/losses", post(register_loss))
        .route("/products/:id/movements", get(list_movements))
}

async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.services.products.list(&filter).await?;
    Ok(success_response(products))
}

async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<NewProduct>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.add(payload).await?;
    Ok(created_response(product))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductChanges>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.edit(id, payload).await?;
    Ok(success_response(product))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.products.remove(id).await?;
    Ok(no_content_response())
}

async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustStock>,
) -> Result<impl IntoResponse, ServiceError> {
    let update = state.services.products.adjust_stock(id, payload).await?;
    Ok(success_response(update))
}

async fn register_loss(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RegisterLoss>,
) -> Result<impl IntoResponse, ServiceError> {
    let update = state.services.products.register_loss(id, payload).await?;
    Ok(success_response(update))
}

async fn list_movements(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let movements = state.services.products.movements(id).await?;
    Ok(success_response(movements))
}
