use crate::{
    entities::{sales_rep, sales_rep::SalesPlan, RecordStatus},
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, validated_body},
    services::sales_reps::{CreateSalesRepInput, UpdateSalesRepInput},
    ApiResult, AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesRepResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub agency_id: Option<Uuid>,
    pub withdrawal_limit: i64,
    pub plan: SalesPlan,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

impl From<sales_rep::Model> for SalesRepResponse {
    fn from(model: sales_rep::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            agency_id: model.agency_id,
            withdrawal_limit: model.withdrawal_limit,
            plan: model.plan,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SalesRepFilter {
    /// Only reps assigned to this agency
    pub agency_id: Option<Uuid>,
}

pub fn sales_rep_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales_reps).post(create_sales_rep))
        .route(
            "/:id",
            get(get_sales_rep)
                .put(update_sales_rep)
                .delete(delete_sales_rep),
        )
}

#[utoipa::path(
    get,
    path = "/api/sales-reps",
    params(SalesRepFilter),
    responses((status = 200, description = "Sales reps ordered by name", body = [SalesRepResponse])),
    tag = "sales-reps"
)]
pub async fn list_sales_reps(
    State(state): State<AppState>,
    Query(filter): Query<SalesRepFilter>,
) -> ApiResult<Vec<SalesRepResponse>> {
    let reps = state.sales_rep_service().list(filter.agency_id).await?;
    Ok(Json(reps.into_iter().map(SalesRepResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/sales-reps/{id}",
    params(("id" = Uuid, Path, description = "Sales rep id")),
    responses(
        (status = 200, description = "Sales rep returned", body = SalesRepResponse),
        (status = 404, description = "Sales rep not found", body = crate::errors::ErrorResponse)
    ),
    tag = "sales-reps"
)]
pub async fn get_sales_rep(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SalesRepResponse> {
    Ok(Json(state.sales_rep_service().get(id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/api/sales-reps",
    request_body = CreateSalesRepInput,
    responses(
        (status = 201, description = "Sales rep created", body = SalesRepResponse),
        (status = 400, description = "Invalid input or unknown agency", body = crate::errors::ErrorResponse)
    ),
    tag = "sales-reps"
)]
pub async fn create_sales_rep(
    State(state): State<AppState>,
    payload: Result<Json<CreateSalesRepInput>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let input = validated_body(payload)?;
    let created = state.sales_rep_service().create(input).await?;
    Ok(created_response(SalesRepResponse::from(created)))
}

#[utoipa::path(
    put,
    path = "/api/sales-reps/{id}",
    params(("id" = Uuid, Path, description = "Sales rep id")),
    request_body = UpdateSalesRepInput,
    responses(
        (status = 200, description = "Sales rep updated", body = SalesRepResponse),
        (status = 400, description = "Invalid input or unknown agency", body = crate::errors::ErrorResponse),
        (status = 404, description = "Sales rep not found", body = crate::errors::ErrorResponse)
    ),
    tag = "sales-reps"
)]
pub async fn update_sales_rep(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateSalesRepInput>, JsonRejection>,
) -> ApiResult<SalesRepResponse> {
    let input = validated_body(payload)?;
    Ok(Json(state.sales_rep_service().update(id, input).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/api/sales-reps/{id}",
    params(("id" = Uuid, Path, description = "Sales rep id")),
    responses(
        (status = 204, description = "Sales rep and their contracts deleted"),
        (status = 404, description = "Sales rep not found", body = crate::errors::ErrorResponse)
    ),
    tag = "sales-reps"
)]
pub async fn delete_sales_rep(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.sales_rep_service().delete(id).await?;
    Ok(no_content_response())
}
