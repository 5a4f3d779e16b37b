use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hexpay_core::{GeofenceError, StoreError};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Service error with HTTP status mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Geofence(#[from] GeofenceError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 - Bad Request
            ApiError::Geofence(_)
            | ApiError::Store(StoreError::Geofence(_))
            | ApiError::Store(StoreError::InvalidMerchant(_))
            | ApiError::Store(StoreError::MissingOwner) => StatusCode::BAD_REQUEST,

            // 404 - Not Found
            ApiError::NotFound(_) | ApiError::Store(StoreError::MerchantNotFound { .. }) => {
                StatusCode::NOT_FOUND
            }

            // 409 - Conflict
            ApiError::Store(StoreError::MerchantExists { .. }) => StatusCode::CONFLICT,

            // 500 - Internal Server Error
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure is worth an error-level log: a server error, or a
    /// malformed cell another component handed over.
    pub fn is_fault(&self) -> bool {
        match self {
            ApiError::Geofence(e) | ApiError::Store(StoreError::Geofence(e)) => {
                !e.is_user_error()
            }
            _ => self.status_code().is_server_error(),
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_fault() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::Geofence(GeofenceError::InvalidCoordinate("lat".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Store(StoreError::Geofence(GeofenceError::EmptyGeofence)),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Store(StoreError::InvalidMerchant("phone".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Store(StoreError::MerchantNotFound {
                    merchant_id: "m".into(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Store(StoreError::MerchantExists {
                    merchant_id: "m".into(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Store(StoreError::Corrupt("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{error}");
        }
    }

    #[test]
    fn test_fault_classification() {
        assert!(!ApiError::Geofence(GeofenceError::EmptyGeofence).is_fault());
        assert!(!ApiError::Store(StoreError::MissingOwner).is_fault());
        assert!(ApiError::Internal("lock poisoned".into()).is_fault());

        // Still a bad request, but logged loudly
        let bogus = ApiError::Store(StoreError::Geofence(GeofenceError::InvalidCell("ff".into())));
        assert_eq!(bogus.status_code(), StatusCode::BAD_REQUEST);
        assert!(bogus.is_fault());
    }
}
