//! Liveness endpoint. Reports whether the database answers a ping; the
//! service itself is up whenever this handler runs.

use crate::{db, AppState};
use axum::{extract::State, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct HealthResponse {
    /// Always `OK` while the process serves requests
    pub status: String,
    pub message: String,
    pub database: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is running", body = HealthResponse)),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = if db::check_connection(&state.db).await {
        HealthStatus::Up
    } else {
        HealthStatus::Down
    };

    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Server is running".to_string(),
        database,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}
