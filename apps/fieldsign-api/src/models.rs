//! Wire models for the fieldsign API

use fieldsign_core::{Field, FieldKind};
use serde::{Deserialize, Serialize};

/// A placed field as the client sends it: relative fractions, no id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDto {
    pub kind: FieldKind,
    pub page: u32,
    #[serde(rename = "xRel")]
    pub x_rel: f64,
    #[serde(rename = "yRel")]
    pub y_rel: f64,
    #[serde(rename = "wRel")]
    pub w_rel: f64,
    #[serde(rename = "hRel")]
    pub h_rel: f64,
}

impl FieldDto {
    pub fn into_field(self, id: u64) -> Field {
        Field {
            id,
            kind: self.kind,
            page: self.page,
            x_rel: self.x_rel,
            y_rel: self.y_rel,
            w_rel: self.w_rel,
            h_rel: self.h_rel,
        }
    }
}

/// Request to sign a document with a placed signature field.
#[derive(Debug, Clone, Deserialize)]
pub struct SignPdfRequest {
    #[serde(rename = "documentId")]
    pub document_id: String,
    #[serde(rename = "signatureImageBase64")]
    pub signature_image_base64: String,
    #[serde(default)]
    pub fields: Vec<FieldDto>,
}

/// Response for a successful signing operation.
#[derive(Debug, Clone, Serialize)]
pub struct SignPdfResponse {
    #[serde(rename = "documentId")]
    pub document_id: String,
    #[serde(rename = "signedUrl")]
    pub signed_url: String,
    #[serde(rename = "originalHash")]
    pub original_hash: String,
    #[serde(rename = "signedHash")]
    pub signed_hash: String,
}
