use crate::errors::ServiceError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use validator::Validate;

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Unwraps a JSON body and runs its `validator` rules. Malformed bodies are
/// reported as validation errors so every client error shares one shape.
pub fn validated_body<T: Validate>(
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, ServiceError> {
    let Json(body) = payload.map_err(|rejection| {
        ServiceError::ValidationError(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    body.validate()?;
    Ok(body)
}
