#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use seedbin_api::{
    config::AppConfig,
    db::{self, DbConfig},
    events::{self, EventSender},
    seed, AppState,
};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Helper harness for spinning up the full router backed by SQLite.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    event_task: tokio::task::JoinHandle<()>,
    _db_dir: Option<TempDir>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}

impl TestApp {
    /// Fresh database loaded with the demo data set.
    pub async fn new() -> Self {
        let app = Self::empty().await;
        seed::seed_demo_data(&app.state.db, false)
            .await
            .expect("failed to seed test database");
        app
    }

    /// Fresh, migrated database with no rows.
    pub async fn empty() -> Self {
        let mut cfg = test_config("sqlite::memory:".to_string());
        // Every in-memory connection is its own database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        Self::start(cfg, None).await
    }

    /// Seeded SQLite file behind the default multi-connection pool, so
    /// concurrent requests contend on real database locks.
    pub async fn file_backed() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("seedbins.db").display());
        let cfg = test_config(url);
        assert!(cfg.db_max_connections > 1);

        let app = Self::start(cfg, Some(dir)).await;
        seed::seed_demo_data(&app.state.db, false)
            .await
            .expect("failed to seed test database");
        app
    }

    async fn start(cfg: AppConfig, db_dir: Option<TempDir>) -> Self {
        let pool = db::establish_connection_with_config(&DbConfig::from(&cfg))
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        let router = seedbin_api::build_router(state.clone());

        Self {
            router,
            state,
            event_task,
            _db_dir: db_dir,
        }
    }

    /// Send a request through the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and decodes the JSON body. Empty bodies decode as `null`.
    pub async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        (status, response_json(response).await)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.json(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::POST, uri, Some(body)).await
    }

    /// Looks up a seeded agency id by name.
    pub async fn agency_id(&self, name: &str) -> Uuid {
        let (_, agencies) = self.get("/api/agencies").await;
        find_id(&agencies, name)
    }

    /// Looks up a seeded sales rep id by name.
    pub async fn sales_rep_id(&self, name: &str) -> Uuid {
        let (_, reps) = self.get("/api/sales-reps").await;
        find_id(&reps, name)
    }

    pub async fn stock_of(&self, bin_code: &str) -> i64 {
        let (status, bin) = self.get(&format!("/api/inventory/bins/{}", bin_code)).await;
        assert_eq!(status, StatusCode::OK);
        bin["currentStock"].as_i64().expect("currentStock")
    }
}

fn test_config(database_url: String) -> AppConfig {
    AppConfig::new(database_url, "127.0.0.1".to_string(), 15_001, "test".to_string())
}

fn find_id(list: &Value, name: &str) -> Uuid {
    list.as_array()
        .and_then(|items| items.iter().find(|item| item["name"] == name))
        .and_then(|item| item["id"].as_str())
        .and_then(|id| Uuid::parse_str(id).ok())
        .unwrap_or_else(|| panic!("{} not found", name))
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not JSON")
    }
}
