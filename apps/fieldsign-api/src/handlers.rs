//! HTTP handlers for the fieldsign API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use fieldsign_core::{SignError, SignRequest};
use fieldsign_pdf::PdfEditor;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{SignPdfRequest, SignPdfResponse};
use crate::state::AppState;
use crate::stores::{is_safe_stem, FsDocumentStore, SqliteAuditStore};

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

type PdfFileResponse = (StatusCode, [(String, String); 2], Vec<u8>);

fn pdf_response(file_name: &str, bytes: Vec<u8>) -> PdfFileResponse {
    (
        StatusCode::OK,
        [
            ("Content-Type".to_string(), "application/pdf".to_string()),
            (
                "Content-Disposition".to_string(),
                format!("inline; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
}

/// Serve a registered source document
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<PdfFileResponse, ApiError> {
    if !is_safe_stem(&id) {
        return Err(SignError::NotFound(id).into());
    }
    let file_name = format!("{}.pdf", id);
    let bytes = tokio::fs::read(state.docs_dir.join(&file_name))
        .await
        .map_err(|_| SignError::NotFound(id))?;
    Ok(pdf_response(&file_name, bytes))
}

/// Serve a previously produced signed artifact
pub async fn get_signed(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<PdfFileResponse, ApiError> {
    let stem = name.strip_suffix(".pdf").unwrap_or(&name);
    if !is_safe_stem(stem) {
        return Err(SignError::NotFound(name).into());
    }
    let file_name = format!("{}.pdf", stem);
    let bytes = tokio::fs::read(state.signed_dir.join(&file_name))
        .await
        .map_err(|_| SignError::NotFound(file_name.clone()))?;
    Ok(pdf_response(&file_name, bytes))
}

/// Sign a document: embed the signature image at the placed field and
/// return the artifact location plus both content hashes.
pub async fn sign_pdf(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignPdfRequest>,
) -> Result<Json<SignPdfResponse>, ApiError> {
    let fields = req
        .fields
        .into_iter()
        .enumerate()
        .map(|(i, dto)| dto.into_field(i as u64 + 1))
        .collect();

    let request = SignRequest {
        document_id: req.document_id,
        image_encoded: req.signature_image_base64,
        fields,
    };

    let store = FsDocumentStore::new(state.docs_dir.clone(), state.signed_dir.clone());
    let audit = SqliteAuditStore::new(state.db.clone());

    let outcome = fieldsign_core::sign(&store, &PdfEditor::new(), &audit, request).await?;

    tracing::info!(
        "Signed document {}: stored {}",
        outcome.document_id,
        outcome.stored_location
    );

    Ok(Json(SignPdfResponse {
        document_id: outcome.document_id,
        signed_url: format!("/pdf/signed/{}", outcome.stored_location),
        original_hash: outcome.original_hash,
        signed_hash: outcome.signed_hash,
    }))
}
