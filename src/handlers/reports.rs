use crate::{
    errors::ServiceError,
    services::reports::{SalesReport, SalesReportQuery},
    ApiResult, AppState,
};
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(sales_report))
        .route("/sales/export", get(export_sales_report))
}

/// Per-rep daily withdrawals and returns derived from bin history
#[utoipa::path(
    get,
    path = "/api/reports/sales",
    params(SalesReportQuery),
    responses(
        (status = 200, description = "Report rows and totals", body = SalesReport),
        (status = 400, description = "Invalid date range", body = crate::errors::ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn sales_report(
    State(state): State<AppState>,
    Query(query): Query<SalesReportQuery>,
) -> ApiResult<SalesReport> {
    Ok(Json(state.report_service().sales_report(&query).await?))
}

#[utoipa::path(
    get,
    path = "/api/reports/sales/export",
    params(SalesReportQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 400, description = "Unknown field or invalid date range", body = crate::errors::ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn export_sales_report(
    State(state): State<AppState>,
    Query(query): Query<SalesReportQuery>,
) -> Result<Response, ServiceError> {
    let export = state.report_service().export_csv(&query).await?;
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        export.filename
    ))
    .map_err(|e| ServiceError::InternalError(e.to_string()))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response())
}
