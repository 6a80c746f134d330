use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use waypool_booking::AllocationError;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError { message: String, available: u32 },
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::ConflictError { message, available } => (
                StatusCode::CONFLICT,
                json!({ "error": message, "available": available }),
            ),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Map allocator failures onto the HTTP surface; the conflict case carries
/// the remaining-seat count for the requester.
pub fn from_allocation(err: AllocationError) -> AppError {
    match err {
        AllocationError::CapacityExhausted { available, .. } => AppError::ConflictError {
            message: err.to_string(),
            available,
        },
        AllocationError::UnknownRide(id) => {
            AppError::NotFoundError(format!("unknown ride {}", id))
        }
        AllocationError::InvalidRequest(msg) => AppError::ValidationError(msg),
        AllocationError::Store(e) => AppError::InternalServerError(e.to_string()),
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
