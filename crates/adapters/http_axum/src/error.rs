//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use scenario_domain::error::{NotFoundError, ScenarioError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: bool,
    message: String,
    status: u16,
}

/// Maps [`ScenarioError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(ScenarioError);

impl ApiError {
    /// A path segment that cannot name an existing scenario.
    pub(crate) fn unknown_scenario(raw_id: &str) -> Self {
        Self(
            NotFoundError {
                entity: "Scenario",
                id: raw_id.to_string(),
            }
            .into(),
        )
    }
}

impl From<ScenarioError> for ApiError {
    fn from(err: ScenarioError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ScenarioError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ScenarioError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            ScenarioError::StorageConflict(err) => {
                tracing::warn!(error = %err, "storage conflict");
                (StatusCode::CONFLICT, err.to_string())
            }
            ScenarioError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            ScenarioError::Unavailable(reason) => {
                (StatusCode::SERVICE_UNAVAILABLE, (*reason).to_string())
            }
        };

        let body = ErrorBody {
            error: true,
            message,
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use scenario_domain::error::{ConflictError, ValidationError};

    async fn render(err: ScenarioError) -> (StatusCode, serde_json::Value) {
        let response = ApiError::from(err).into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn should_map_validation_error_to_bad_request() {
        let (status, body) = render(ValidationError::NoActions.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            serde_json::json!({
                "error": true,
                "message": "at least one action is required",
                "status": 400
            })
        );
    }

    #[tokio::test]
    async fn should_map_conflict_to_409() {
        let (status, body) = render(
            ConflictError {
                owner_id: "u1".to_string(),
                expected: 1,
                actual: 2,
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], 409);
    }

    #[tokio::test]
    async fn should_hide_storage_error_details() {
        let (status, body) =
            render(ScenarioError::Storage(Box::new(std::io::Error::other("disk on fire")))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "internal server error");
    }

    #[tokio::test]
    async fn should_map_unavailable_to_503() {
        let (status, _) = render(ScenarioError::Unavailable("shutting down")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
