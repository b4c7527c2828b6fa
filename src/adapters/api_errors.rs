use crate::domain::error::PipelineError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Newtype so the domain error can implement axum's response trait.
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.0 {
            PipelineError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
            ),
            PipelineError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            // Provider messages are shown verbatim; the state is unchanged so the user can retry.
            PipelineError::Provider(msg) => (
                StatusCode::BAD_GATEWAY,
                "provider_error",
                format!("{msg}. Please try again"),
            ),
            PipelineError::Transport(err) | PipelineError::Decode(err) => {
                tracing::warn!("provider unavailable: {err}");
                (
                    StatusCode::BAD_GATEWAY,
                    "provider_unavailable",
                    "payment provider unavailable, please try again".to_string(),
                )
            }
            PipelineError::Persistence(err) => {
                tracing::error!("database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            PipelineError::Config(err) => {
                tracing::error!("config error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error_code": error_code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
