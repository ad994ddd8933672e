use crate::{
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, validated_body},
    services::contracts::{ContractFilter, ContractView, CreateContractInput, UpdateContractInput},
    ApiResult, AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

pub fn contract_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contracts).post(create_contract))
        .route(
            "/:id",
            get(get_contract).put(update_contract).delete(delete_contract),
        )
}

#[utoipa::path(
    get,
    path = "/api/contracts",
    params(ContractFilter),
    responses((status = 200, description = "Contracts with current month usage", body = [ContractView])),
    tag = "contracts"
)]
pub async fn list_contracts(
    State(state): State<AppState>,
    Query(filter): Query<ContractFilter>,
) -> ApiResult<Vec<ContractView>> {
    Ok(Json(state.contract_service().list(filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/contracts/{id}",
    params(("id" = Uuid, Path, description = "Contract id")),
    responses(
        (status = 200, description = "Contract returned", body = ContractView),
        (status = 404, description = "Contract not found", body = crate::errors::ErrorResponse)
    ),
    tag = "contracts"
)]
pub async fn get_contract(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ContractView> {
    Ok(Json(state.contract_service().get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/contracts",
    request_body = CreateContractInput,
    responses(
        (status = 201, description = "Contract created", body = ContractView),
        (status = 400, description = "Invalid dates, terms or sales rep", body = crate::errors::ErrorResponse)
    ),
    tag = "contracts"
)]
pub async fn create_contract(
    State(state): State<AppState>,
    payload: Result<Json<CreateContractInput>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let input = validated_body(payload)?;
    let created = state.contract_service().create(input).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    put,
    path = "/api/contracts/{id}",
    params(("id" = Uuid, Path, description = "Contract id")),
    request_body = UpdateContractInput,
    responses(
        (status = 200, description = "Contract updated", body = ContractView),
        (status = 400, description = "Invalid dates, terms or sales rep", body = crate::errors::ErrorResponse),
        (status = 404, description = "Contract not found", body = crate::errors::ErrorResponse)
    ),
    tag = "contracts"
)]
pub async fn update_contract(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateContractInput>, JsonRejection>,
) -> ApiResult<ContractView> {
    let input = validated_body(payload)?;
    Ok(Json(state.contract_service().update(id, input).await?))
}

#[utoipa::path(
    delete,
    path = "/api/contracts/{id}",
    params(("id" = Uuid, Path, description = "Contract id")),
    responses(
        (status = 204, description = "Contract deleted"),
        (status = 404, description = "Contract not found", body = crate::errors::ErrorResponse)
    ),
    tag = "contracts"
)]
pub async fn delete_contract(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.contract_service().delete(id).await?;
    Ok(no_content_response())
}
