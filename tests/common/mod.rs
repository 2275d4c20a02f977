#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use meu_bentin::{
    auth::hash_password,
    config::AppConfig,
    db::{self, DbPool},
    events::{self, EventSender},
    models::{NewProduct, Product},
    store::{Backend, SqlStore},
    AppState,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const OPERATOR: &str = "loja";
pub const PASSWORD: &str = "bentin-teste-123";
const SECRET: &str = "integration-secret-with-plenty-of-distinct-characters-0123456789-abcdef";

/// Fresh in-memory SQLite with the schema applied.
///
/// One connection only: every connection to `sqlite::memory:` gets its own
/// database.
pub async fn test_pool() -> Arc<DbPool> {
    let mut cfg = AppConfig::new(
        "sqlite::memory:".to_string(),
        SECRET.to_string(),
        OPERATOR.to_string(),
        String::new(),
    );
    cfg.db_max_connections = 1;
    cfg.db_min_connections = 1;

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .expect("failed to create test database");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations in tests");
    Arc::new(pool)
}

pub async fn sql_store() -> SqlStore {
    SqlStore::new(test_pool().await)
}

pub fn product_form(name: &str, price: Decimal, quantity: i32) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        price,
        cost_price: price / Decimal::from(2),
        quantity,
        min_quantity: 1,
        sizes: vec!["P".into(), "M".into()],
        colors: vec!["Rosa".into()],
        ..Default::default()
    }
}

/// Application harness backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub token: String,
    _drafts_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = test_pool().await;
        let drafts_dir = TempDir::new().expect("temp drafts dir");

        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            SECRET.to_string(),
            OPERATOR.to_string(),
            hash_password(PASSWORD).expect("hash operator password"),
        );
        cfg.drafts_dir = drafts_dir.path().to_string_lossy().into_owned();
        cfg.draft_debounce_ms = 50;

        let mut backend = Backend::from_store(Arc::new(SqlStore::new(pool.clone())));
        backend.database = Some(pool);

        let (event_sender, event_rx) = EventSender::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(cfg, backend, event_sender);
        let token = state
            .auth
            .generate_token(OPERATOR)
            .expect("issue test token")
            .access_token;

        Self {
            router: meu_bentin::app_router(state.clone()),
            state,
            token,
            _drafts_dir: drafts_dir,
            _event_task: event_task,
        }
    }

    /// Sends a request and returns the status and parsed JSON body
    /// (`Value::Null` for empty bodies, a string for plain-text rejections).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router never fails");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, Some(&self.token)).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), Some(&self.token))
            .await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body), Some(&self.token))
            .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None, Some(&self.token))
            .await
    }

    pub async fn create_product(&self, name: &str, price: &str, quantity: i32) -> Product {
        let (status, body) = self
            .post(
                "/api/v1/products",
                serde_json::json!({
                    "name": name,
                    "price": price,
                    "costPrice": "10.00",
                    "quantity": quantity,
                    "minQuantity": 1,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create product failed: {}", body);
        serde_json::from_value(body["data"].clone()).expect("product payload")
    }
}
