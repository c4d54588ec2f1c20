use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use portwatch_domain::DomainError;
use serde_json::json;
use tracing::error;

/// HTTP-facing error: a status code plus a JSON `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// For feature insertion the unknown-layer case is a caller mistake in the
    /// request body, so it answers 400 rather than the usual 404.
    pub fn from_insert_feature(e: DomainError) -> Self {
        match e {
            DomainError::LayerNotFound(name) => {
                Self::bad_request(format!("Layer not found: {name}"))
            }
            other => other.into(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        let status = match &e {
            DomainError::LayerNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::LayerAlreadyExists(_) => StatusCode::CONFLICT,
            DomainError::InvalidGeometry(_) | DomainError::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            DomainError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, message = %self.message, "request failed");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        let cases = [
            (
                DomainError::LayerNotFound("a".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                DomainError::LayerAlreadyExists("a".into()),
                StatusCode::CONFLICT,
            ),
            (
                DomainError::InvalidGeometry("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::UpstreamUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                DomainError::StorageFailure(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (e, status) in cases {
            assert_eq!(ApiError::from(e).status, status);
        }
    }

    #[test]
    fn insert_feature_downgrades_missing_layer_to_bad_request() {
        let err = ApiError::from_insert_feature(DomainError::LayerNotFound("zones".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
