use crate::{
    entities::{agency, RecordStatus},
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, validated_body},
    services::agencies::{CreateAgencyInput, UpdateAgencyInput},
    ApiResult, AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgencyResponse {
    pub id: Uuid,
    pub name: String,
    pub allocation: i64,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<agency::Model> for AgencyResponse {
    fn from(model: agency::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            allocation: model.allocation,
            contact_person: model.contact_person,
            email: model.email,
            phone: model.phone,
            address: model.address,
            status: model.status,
            created_at: model.created_at,
            last_updated: model.last_updated,
        }
    }
}

pub fn agency_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_agencies).post(create_agency))
        .route(
            "/:id",
            get(get_agency).put(update_agency).delete(delete_agency),
        )
}

#[utoipa::path(
    get,
    path = "/api/agencies",
    responses((status = 200, description = "Agencies ordered by name", body = [AgencyResponse])),
    tag = "agencies"
)]
pub async fn list_agencies(State(state): State<AppState>) -> ApiResult<Vec<AgencyResponse>> {
    let agencies = state.agency_service().list().await?;
    Ok(Json(agencies.into_iter().map(AgencyResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/agencies/{id}",
    params(("id" = Uuid, Path, description = "Agency id")),
    responses(
        (status = 200, description = "Agency returned", body = AgencyResponse),
        (status = 404, description = "Agency not found", body = crate::errors::ErrorResponse)
    ),
    tag = "agencies"
)]
pub async fn get_agency(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<AgencyResponse> {
    Ok(Json(state.agency_service().get(id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/api/agencies",
    request_body = CreateAgencyInput,
    responses(
        (status = 201, description = "Agency created", body = AgencyResponse),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse)
    ),
    tag = "agencies"
)]
pub async fn create_agency(
    State(state): State<AppState>,
    payload: Result<Json<CreateAgencyInput>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let input = validated_body(payload)?;
    let created = state.agency_service().create(input).await?;
    Ok(created_response(AgencyResponse::from(created)))
}

#[utoipa::path(
    put,
    path = "/api/agencies/{id}",
    params(("id" = Uuid, Path, description = "Agency id")),
    request_body = UpdateAgencyInput,
    responses(
        (status = 200, description = "Agency updated", body = AgencyResponse),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Agency not found", body = crate::errors::ErrorResponse)
    ),
    tag = "agencies"
)]
pub async fn update_agency(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateAgencyInput>, JsonRejection>,
) -> ApiResult<AgencyResponse> {
    let input = validated_body(payload)?;
    Ok(Json(state.agency_service().update(id, input).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/api/agencies/{id}",
    params(("id" = Uuid, Path, description = "Agency id")),
    responses(
        (status = 204, description = "Agency deleted"),
        (status = 404, description = "Agency not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Agency still attached to a bin", body = crate::errors::ErrorResponse)
    ),
    tag = "agencies"
)]
pub async fn delete_agency(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.agency_service().delete(id).await?;
    Ok(no_content_response())
}
