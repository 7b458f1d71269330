use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domains::registrants::RegistryError;

/// HTTP face of `RegistryError`
#[derive(Debug)]
pub struct ApiError(pub RegistryError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::InvalidTransition { .. } | RegistryError::StaleRecord(_) => {
                StatusCode::CONFLICT
            }
            RegistryError::InvalidSector(_)
            | RegistryError::InvalidInput(_)
            | RegistryError::MissingStatus(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RegistryError::ConcurrentAllocationConflict { .. }
            | RegistryError::IdentifierAllocationFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
            RegistryError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Request failed");
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
