use crate::{services::dashboard::DashboardView, ApiResult, AppState};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(latest_dashboard))
        .route("/refresh", post(refresh_dashboard))
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Latest dashboard snapshot", body = DashboardView),
        (status = 404, description = "No snapshot stored yet", body = crate::errors::ErrorResponse)
    ),
    tag = "dashboard"
)]
pub async fn latest_dashboard(State(state): State<AppState>) -> ApiResult<DashboardView> {
    Ok(Json(state.dashboard_service().latest().await?))
}

/// Recompute totals from the bins and store them as the newest snapshot
#[utoipa::path(
    post,
    path = "/api/dashboard/refresh",
    responses(
        (status = 200, description = "Newly stored snapshot", body = DashboardView)
    ),
    tag = "dashboard"
)]
pub async fn refresh_dashboard(State(state): State<AppState>) -> ApiResult<DashboardView> {
    Ok(Json(state.dashboard_service().refresh().await?))
}
