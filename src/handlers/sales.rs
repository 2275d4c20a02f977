use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    models::{NewSale, SaleFilter},
    AppState,
};

pub fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list_sales).post(create_sale))
        .route("/sales/lines", get(list_sale_lines))
        .route("/sales/:id", get(get_sale))
        .route("/sales/:id/cancel", post(cancel_sale))
}

async fn list_sales(
    State(state): State<AppState>,
    Query(filter): Query<SaleFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let sales = state.services.sales.list(&filter).await?;
    Ok(success_response(sales))
}

async fn create_sale(
    State(state): State<AppState>,
    Json(payload): Json<NewSale>,
) -> Result<impl IntoResponse, ServiceError> {
    let sale = state.services.sales.add_sale(payload).await?;
    Ok(created_response(sale))
}

/// Flat one-row-per-item view over the loaded sales
async fn list_sale_lines(
    State(state): State<AppState>,
    Query(filter): Query<SaleFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.sales.sale_lines(&filter)))
}

async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let sale = state.services.sales.get(id).await?;
    Ok(success_response(sale))
}

async fn cancel_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let sale = state.services.sales.cancel_sale(id).await?;
    Ok(success_response(sale))
}
