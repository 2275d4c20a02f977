//! Meu Bentin back office
//!
//! Catalogue, stock, sales, sellers and monthly goals for a children's
//! clothing store, served as a JSON API over a relational or local store.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod adapters;
pub mod auth;
pub mod config;
pub mod db;
pub mod drafts;
pub mod entities;
pub mod errors;
pub mod events;
pub mod format;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::HeaderValue, middleware, Router};
use chrono::Utc;
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::{AuthConfig, AuthService};
use crate::config::{AppConfig, AppConfigError};
use crate::db::DbPool;
use crate::drafts::{DraftAutosaver, DraftStore};
use crate::events::EventSender;
use crate::services::AppServices;
use crate::state::StateStore;
use crate::store::Backend;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: AppServices,
    pub auth: Arc<AuthService>,
    pub drafts: DraftAutosaver,
    pub database: Option<Arc<DbPool>>,
}

impl AppState {
    /// Wires services, auth and the draft autosaver around an open backend.
    /// Must run inside a tokio runtime.
    pub fn new(config: AppConfig, backend: Backend, event_sender: EventSender) -> Self {
        let database = backend.database.clone();
        let services = AppServices::new(
            backend,
            StateStore::default(),
            Arc::new(event_sender),
            config.store_offset(),
        );
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config)));
        let drafts = DraftAutosaver::spawn(
            Arc::new(DraftStore::new(PathBuf::from(&config.drafts_dir))),
            Duration::from_millis(config.draft_debounce_ms),
        );

        Self {
            config: Arc::new(config),
            services,
            auth,
            drafts,
            database,
        }
    }
}

// Common response wrappers
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            meta: Some(ResponseMeta {
                timestamp: Utc::now().to_rfc3339(),
            }),
        }
    }
}

/// `/api/v1` routes. Everything except login requires a bearer token.
pub fn api_v1_routes(auth: Arc<AuthService>) -> Router<AppState> {
    let protected = Router::new()
        .merge(handlers::products::product_routes())
        .merge(handlers::sales::sale_routes())
        .merge(handlers::lookups::lookup_routes())
        .merge(handlers::goals::goal_routes())
        .merge(handlers::reports::report_routes())
        .merge(handlers::state::state_routes())
        .merge(handlers::drafts::draft_routes())
        .route_layer(middleware::from_fn_with_state(auth, auth::auth_middleware));

    Router::new()
        .merge(handlers::auth::auth_routes())
        .merge(protected)
}

/// Full application router without CORS, which depends on deployment config.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::health::health_routes())
        .nest("/api/v1", api_v1_routes(state.auth.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Explicit origins when configured, permissive only where config allows it.
pub fn cors_layer(cfg: &AppConfig) -> Result<CorsLayer, AppConfigError> {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any));
    }
    if cfg.should_allow_permissive_cors() {
        info!("Using permissive CORS because explicit origins were not configured");
        return Ok(CorsLayer::permissive());
    }
    Err(AppConfigError::Invalid(
        "Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true"
            .to_string(),
    ))
}
