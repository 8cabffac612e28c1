use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// AppError
///
/// The single error type crossing the store, auth, and handler layers. Each variant
/// maps to exactly one HTTP status in the `IntoResponse` impl below.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid id given")]
    InvalidId,
    #[error("invalid JSON request")]
    BadRequest,
    #[error("invalid query parameters")]
    InvalidQuery,

    // The message is fixed. The cause of a rejected credential only goes to the logs.
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("forbidden")]
    Forbidden,

    #[error("{0} resourse not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("booking already canceled")]
    AlreadyCanceled,

    #[error("{operation} on {entity} failed: {message}")]
    Store {
        operation: &'static str,
        entity: &'static str,
        message: String,
    },
    /// Step one of room creation succeeded, step two did not.
    #[error("room {room_id} was persisted but not registered on hotel {hotel_id}: {source}")]
    OrphanedRoom {
        room_id: Uuid,
        hotel_id: Uuid,
        #[source]
        source: Box<AppError>,
    },
    #[error("{0}")]
    Internal(String),

    #[error("request deadline exceeded")]
    Timeout,
    #[error("request canceled")]
    Canceled,
}

pub type AppResult<T> = Result<T, AppError>;

/// ErrorBody
///
/// Wire envelope for every non-2xx response: `{ "code": 404, "error": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct ErrorBody {
    pub code: u16,
    pub error: String,
}

impl AppError {
    pub fn store(operation: &'static str, entity: &'static str, err: impl std::fmt::Display) -> Self {
        AppError::Store {
            operation,
            entity,
            message: err.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidId
            | AppError::BadRequest
            | AppError::InvalidQuery => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::AlreadyCanceled => StatusCode::CONFLICT,
            AppError::Store { .. } | AppError::OrphanedRoom { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            // 499: client closed request (nginx convention).
            AppError::Canceled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::SERVICE_UNAVAILABLE)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            code: status.as_u16(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
