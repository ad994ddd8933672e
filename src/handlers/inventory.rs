use crate::{
    errors::ServiceError,
    handlers::common::validated_body,
    services::inventory::{AgencyStock, BinMutation, BinView, HistoryEntryView, TransferOutcome},
    ApiResult, AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Body for add and withdraw.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BinMutationRequest {
    #[validate(range(min = 1, message = "quantity must be a positive integer"))]
    pub quantity: i64,
    pub agency_id: Uuid,
    pub sr_id: Uuid,
}

impl From<&BinMutationRequest> for BinMutation {
    fn from(req: &BinMutationRequest) -> Self {
        BinMutation {
            quantity: req.quantity,
            agency_id: req.agency_id,
            sales_rep_id: req.sr_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[validate(range(min = 1, message = "quantity must be a positive integer"))]
    pub quantity: i64,
    pub agency_id: Uuid,
    pub sr_id: Uuid,
    /// Target bin id or code
    #[validate(length(min = 1))]
    pub target_bin_id: String,
}

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/bins", get(list_bins))
        .route("/bins/:id", get(get_bin))
        .route("/bins/:id/add", post(add_stock))
        .route("/bins/:id/withdraw", post(withdraw_stock))
        .route("/bins/:id/transfer", post(transfer_stock))
        .route("/bins/:id/history", get(bin_history))
        .route("/aggregate", get(aggregate_by_agency))
}

/// List every bin with owners, sharers and limits resolved to names
#[utoipa::path(
    get,
    path = "/api/inventory/bins",
    responses(
        (status = 200, description = "Bins returned", body = [BinView]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_bins(State(state): State<AppState>) -> ApiResult<Vec<BinView>> {
    Ok(Json(state.inventory_service().list_bins().await?))
}

#[utoipa::path(
    get,
    path = "/api/inventory/bins/{id}",
    params(("id" = String, Path, description = "Bin id or code, e.g. BIN-001")),
    responses(
        (status = 200, description = "Bin returned", body = BinView),
        (status = 404, description = "Bin not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_bin(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<BinView> {
    Ok(Json(state.inventory_service().get_bin(&id).await?))
}

/// Add stock to a bin on behalf of an agency and sales rep
#[utoipa::path(
    post,
    path = "/api/inventory/bins/{id}/add",
    params(("id" = String, Path, description = "Bin id or code")),
    request_body = BinMutationRequest,
    responses(
        (status = 200, description = "Updated bin", body = BinView),
        (status = 400, description = "Invalid quantity or capacity exceeded", body = crate::errors::ErrorResponse),
        (status = 404, description = "Bin not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn add_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<BinMutationRequest>, JsonRejection>,
) -> ApiResult<BinView> {
    let body = validated_body(payload)?;
    let view = state
        .inventory_service()
        .add_stock(&id, BinMutation::from(&body))
        .await?;
    Ok(Json(view))
}

/// Withdraw stock, subject to the agency's limit on the bin and available stock
#[utoipa::path(
    post,
    path = "/api/inventory/bins/{id}/withdraw",
    params(("id" = String, Path, description = "Bin id or code")),
    request_body = BinMutationRequest,
    responses(
        (status = 200, description = "Updated bin", body = BinView),
        (status = 400, description = "Limit exceeded, not enough stock or invalid quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Bin not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn withdraw_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<BinMutationRequest>, JsonRejection>,
) -> ApiResult<BinView> {
    let body = validated_body(payload)?;
    let view = state
        .inventory_service()
        .withdraw_stock(&id, BinMutation::from(&body))
        .await?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/api/inventory/bins/{id}/transfer",
    params(("id" = String, Path, description = "Source bin id or code")),
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Both bins after the transfer", body = TransferOutcome),
        (status = 400, description = "Rule violation or invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Source or target bin not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn transfer_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<TransferOutcome> {
    let body = validated_body(payload)?;
    let cmd = BinMutation {
        quantity: body.quantity,
        agency_id: body.agency_id,
        sales_rep_id: body.sr_id,
    };
    let outcome = state
        .inventory_service()
        .transfer_stock(&id, body.target_bin_id.trim(), cmd)
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/inventory/bins/{id}/history",
    params(("id" = String, Path, description = "Bin id or code")),
    responses(
        (status = 200, description = "History in insertion order", body = [HistoryEntryView]),
        (status = 404, description = "Bin not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn bin_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<HistoryEntryView>> {
    Ok(Json(state.inventory_service().history(&id).await?))
}

/// Stock visible to each agency across the bins it owns or shares
#[utoipa::path(
    get,
    path = "/api/inventory/aggregate",
    responses(
        (status = 200, description = "Per-agency totals", body = [AgencyStock])
    ),
    tag = "inventory"
)]
pub async fn aggregate_by_agency(
    State(state): State<AppState>,
) -> Result<Json<Vec<AgencyStock>>, ServiceError> {
    Ok(Json(state.inventory_service().aggregate_by_agency().await?))
}
