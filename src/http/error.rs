use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::engine::EngineError;

/// Error returned by every handler, rendered as `{error, code}`.
/// Capacity conflicts also carry `available` and `requested`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    available: Option<u32>,
    requested: Option<u32>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    requested: Option<u32>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            available: None,
            requested: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::InvalidRange => Self::new(StatusCode::BAD_REQUEST, "INVALID_RANGE", message),
            EngineError::InvalidQuantity => Self::new(StatusCode::BAD_REQUEST, "INVALID_QUANTITY", message),
            EngineError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message),
            EngineError::LimitExceeded(_) => Self::new(StatusCode::BAD_REQUEST, "LIMIT_EXCEEDED", message),
            EngineError::InvalidTransition { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_TRANSITION", message)
            }
            EngineError::UnknownRoomType { .. } => {
                Self::new(StatusCode::NOT_FOUND, "ROOM_TYPE_NOT_FOUND", message)
            }
            EngineError::HotelNotFound(_) => Self::new(StatusCode::NOT_FOUND, "HOTEL_NOT_FOUND", message),
            EngineError::ReservationNotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "RESERVATION_NOT_FOUND", message)
            }
            EngineError::CapacityConflict { available, requested } => Self {
                available: Some(available),
                requested: Some(requested),
                ..Self::new(StatusCode::CONFLICT, "CAPACITY_CONFLICT", message)
            },
            EngineError::WalError(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, code = self.code, "{}", self.message);
        }
        let body = ErrorBody {
            error: self.message,
            code: self.code,
            available: self.available,
            requested: self.requested,
        };
        (self.status, Json(body)).into_response()
    }
}
