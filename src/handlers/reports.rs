use axum::{extract::State, response::IntoResponse, routing::get, Router};

use crate::{errors::ServiceError, handlers::common::success_response, AppState};

pub fn report_routes() -> Router<AppState> {
    Router::new().route("/reports/dashboard", get(dashboard))
}

async fn dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.reports.dashboard()))
}
