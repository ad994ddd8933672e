//! Seed bin inventory service.
//!
//! Agencies share physical seed bins. Each bin has owners and sharers, a
//! per-agency withdrawal limit, and an append-only movement history. The HTTP
//! surface lives under `/api`; see [`build_router`].
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod seed;
pub mod services;
pub mod telemetry;

use axum::{middleware, response::Json, Router};
use std::sync::Arc;

use crate::db::DbPool;
use crate::handlers::AppServices;
use crate::services::{
    agencies::AgencyService, contracts::ContractService, dashboard::DashboardService,
    inventory::InventoryService, reports::ReportService, sales_reps::SalesRepService,
};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: config::AppConfig, event_sender: events::EventSender) -> Self {
        let services = AppServices::new(db.clone(), event_sender.clone());
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }

    pub fn inventory_service(&self) -> Arc<InventoryService> {
        self.services.inventory.clone()
    }

    pub fn agency_service(&self) -> Arc<AgencyService> {
        self.services.agencies.clone()
    }

    pub fn sales_rep_service(&self) -> Arc<SalesRepService> {
        self.services.sales_reps.clone()
    }

    pub fn dashboard_service(&self) -> Arc<DashboardService> {
        self.services.dashboard.clone()
    }

    pub fn contract_service(&self) -> Arc<ContractService> {
        self.services.contracts.clone()
    }

    pub fn report_service(&self) -> Arc<ReportService> {
        self.services.reports.clone()
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<T>, errors::ServiceError>;

/// Routes mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health::health_routes())
        .nest("/agencies", handlers::agencies::agency_routes())
        .nest("/sales-reps", handlers::sales_reps::sales_rep_routes())
        .nest("/dashboard", handlers::dashboard::dashboard_routes())
        .nest("/inventory", handlers::inventory::inventory_routes())
        .nest("/contracts", handlers::contracts::contract_routes())
        .nest("/reports", handlers::reports::report_routes())
}

/// Full application router: API, OpenAPI docs, request ids and HTTP tracing.
/// CORS and compression are added by the binary.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .fallback(route_not_found)
        .with_state(state)
        .merge(openapi::swagger_ui())
        .layer(telemetry::configure_http_tracing())
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}

async fn route_not_found(uri: axum::http::Uri) -> errors::ServiceError {
    errors::ServiceError::NotFound(format!("Route not found: {}", uri.path()))
}
