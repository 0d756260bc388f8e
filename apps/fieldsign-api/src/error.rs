//! Error types for the fieldsign API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fieldsign_core::SignError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Sign(#[from] SignError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Sign(err) => {
                let (status, code) = match err {
                    SignError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                    SignError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
                    SignError::UnsupportedImageFormat(_) => {
                        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_image_format")
                    }
                    SignError::MissingSignatureField => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "missing_signature_field")
                    }
                    SignError::PersistenceFailure(_) => {
                        tracing::error!("Persistence failure: {}", err);
                        (StatusCode::INTERNAL_SERVER_ERROR, "persistence_failure")
                    }
                    SignError::AuditFailure { .. } => {
                        tracing::error!("Audit failure: {}", err);
                        (StatusCode::INTERNAL_SERVER_ERROR, "audit_failure")
                    }
                    SignError::Document(_) => {
                        tracing::error!("Document error: {}", err);
                        (StatusCode::INTERNAL_SERVER_ERROR, "document_error")
                    }
                };
                (status, code, err.to_string())
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
