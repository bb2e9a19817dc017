use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Reasons a scheduling request is rejected before any mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    InvalidRange,
    Overlap,
    OutOfWindow,
    Conflict,
    PastBooking,
}

impl ValidationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationKind::InvalidRange => "invalid_range",
            ValidationKind::Overlap => "overlap",
            ValidationKind::OutOfWindow => "out_of_window",
            ValidationKind::Conflict => "conflict",
            ValidationKind::PastBooking => "past_booking",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ValidationKind::InvalidRange => "end time must be after start time",
            ValidationKind::Overlap => "window overlaps an existing availability slot",
            ValidationKind::OutOfWindow => "window is not inside any availability slot of the provider",
            ValidationKind::Conflict => "window conflicts with an existing appointment",
            ValidationKind::PastBooking => "appointments must start in the future",
        }
    }
}

/// Domain error shared by the availability and appointment cells.
///
/// All variants are raised before state is touched, so a caller can always
/// resubmit after fixing the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Validation error: {}", .0.message())]
    Validation(ValidationKind),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Invalid role: {0}")]
    Role(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl SchedulingError {
    pub fn kind(&self) -> &'static str {
        match self {
            SchedulingError::Validation(kind) => kind.as_str(),
            SchedulingError::Permission(_) => "permission_denied",
            SchedulingError::State(_) => "invalid_state",
            SchedulingError::Role(_) => "invalid_role",
            SchedulingError::NotFound(_) => "not_found",
            SchedulingError::Unavailable(_) => "unavailable",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            SchedulingError::Validation(ValidationKind::Conflict)
            | SchedulingError::Validation(ValidationKind::Overlap) => StatusCode::CONFLICT,
            SchedulingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SchedulingError::Permission(_) => StatusCode::FORBIDDEN,
            SchedulingError::State(_) => StatusCode::CONFLICT,
            SchedulingError::Role(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SchedulingError::NotFound(_) => StatusCode::NOT_FOUND,
            SchedulingError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "unauthenticated",
            AppError::BadRequest(_) => "bad_request",
            AppError::Internal(_) => "internal",
            AppError::Scheduling(e) => e.kind(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            AppError::Scheduling(e) => (e.status(), e.to_string()),
        };

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, self);
        } else {
            tracing::warn!("Request rejected: {}: {}", status, message);
        }

        let body = Json(json!({
            "error": {
                "kind": self.kind(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
