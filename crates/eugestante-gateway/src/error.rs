use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use eugestante_core::EuGestanteError;
use eugestante_medications::StoreError;
use serde_json::json;
use tracing::error;

/// Handler error: an [`EuGestanteError`] rendered as `{ "error": { code, message } }`.
#[derive(Debug)]
pub struct ApiError(pub EuGestanteError);

impl From<EuGestanteError> for ApiError {
    fn from(e: EuGestanteError) -> Self {
        Self(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            EuGestanteError::InvalidTime(_) | EuGestanteError::InvalidMedication(_) => {
                StatusCode::BAD_REQUEST
            }
            EuGestanteError::MedicationNotFound { .. } => StatusCode::NOT_FOUND,
            _ => {
                error!(error = %self.0, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = json!({
            "error": {
                "code": self.0.code(),
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}
