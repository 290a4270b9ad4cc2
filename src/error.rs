use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Crate-wide request failure taxonomy. Every handler and store method
/// surfaces one of these; the wire shape is
/// `{"success": false, "kind": "...", "message": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("row must be within 1..={rows} and seat within 1..={seats_in_row} for this dome")]
    InvalidSeatCoordinate { rows: i32, seats_in_row: i32 },

    #[error("this seat is already taken for this show session")]
    SeatAlreadyTaken,

    #[error("{0}")]
    Validation(String),

    #[error("you do not have permission to perform this action")]
    PermissionDenied,

    #[error("authentication required")]
    Unauthorized,

    #[error("internal server error")]
    Internal,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Log an unexpected error with its context and collapse it to `Internal`.
    pub fn internal(context: &'static str, err: impl std::fmt::Display) -> Self {
        tracing::error!("{}: {}", context, err);
        ApiError::Internal
    }

    /// Stable machine-readable discriminant for clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidSeatCoordinate { .. } => "invalid_seat_coordinate",
            ApiError::SeatAlreadyTaken => "seat_already_taken",
            ApiError::Validation(_) => "validation_error",
            ApiError::PermissionDenied => "permission_denied",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Internal => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidSeatCoordinate { .. } => StatusCode::BAD_REQUEST,
            ApiError::SeatAlreadyTaken => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Unexpected storage failures are logged once here; the specific
// constraint-violation translations happen in the postgres store before
// this conversion is reached.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("database error: {:?}", err);
        ApiError::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_statuses_are_stable() {
        assert_eq!(ApiError::NotFound("show session").kind(), "not_found");
        assert_eq!(
            ApiError::NotFound("show session").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::SeatAlreadyTaken.kind(), "seat_already_taken");
        assert_eq!(ApiError::SeatAlreadyTaken.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::InvalidSeatCoordinate {
                rows: 10,
                seats_in_row: 15
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::PermissionDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn messages_name_the_missing_entity() {
        assert_eq!(
            ApiError::NotFound("reservation").to_string(),
            "reservation not found"
        );
        assert_eq!(
            ApiError::InvalidSeatCoordinate {
                rows: 10,
                seats_in_row: 15
            }
            .to_string(),
            "row must be within 1..=10 and seat within 1..=15 for this dome"
        );
    }
}
