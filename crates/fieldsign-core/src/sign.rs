//! Signing orchestrator
//!
//! Sequences one signing operation end to end: locate the signature field,
//! decode the image, load the source, transform the field with the loaded
//! page's true dimensions, fit and draw, serialize, persist, and append the
//! audit record. Single pass, no retries, terminal on first failure; no
//! partial artifact is reachable by the caller when a step before persist
//! fails.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info};

use crate::audit::{digest, AuditRecord};
use crate::coords::to_document_box;
use crate::error::SignError;
use crate::fit::{fit, FittedRect};
use crate::geometry::{Field, FieldKind};
use crate::image::SignatureImage;

/// Conservative identifier check for stores that map document ids or
/// artifact names to file stems. Anything that could walk a directory
/// tree is rejected.
pub fn is_safe_stem(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Source and output byte storage. Ids are opaque; unsupported ones fail
/// with [`SignError::NotFound`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Vec<u8>, SignError>;

    /// Store output bytes under the given name and return a location
    /// reference. The store owns extension and location semantics.
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<String, SignError>;
}

/// Document mutation capability. Implementations own the document format;
/// the engine only ever addresses pages by 0-based index and rectangles in
/// the document's native units.
pub trait DocumentEditor {
    type Handle;
    type ImageRef;

    fn open_for_edit(&self, bytes: &[u8]) -> Result<Self::Handle, SignError>;

    /// True width and height of a page, in document units. Must reflect the
    /// loaded document, never an assumed default.
    fn page_size(&self, handle: &Self::Handle, page_index: u32) -> Result<(f64, f64), SignError>;

    fn embed_raster(
        &self,
        handle: &mut Self::Handle,
        image: &SignatureImage,
    ) -> Result<Self::ImageRef, SignError>;

    fn draw_image(
        &self,
        handle: &mut Self::Handle,
        image: Self::ImageRef,
        page_index: u32,
        rect: &FittedRect,
    ) -> Result<(), SignError>;

    fn serialize(&self, handle: Self::Handle) -> Result<Vec<u8>, SignError>;
}

/// Append-only audit capability. The store assigns the timestamp and the
/// chain linkage; records are never mutated or deleted.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(
        &self,
        document_id: &str,
        original_hash: &str,
        signed_hash: &str,
    ) -> Result<AuditRecord, SignError>;
}

/// One signing request: a source document, an encoded signature image, and
/// the caller's field geometry in relative form.
#[derive(Debug, Clone)]
pub struct SignRequest {
    pub document_id: String,
    pub image_encoded: String,
    pub fields: Vec<Field>,
}

/// Result of a successful signing operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SignOutcome {
    pub document_id: String,
    pub stored_location: String,
    pub original_hash: String,
    pub signed_hash: String,
}

/// Run one signing operation.
///
/// The signature field is validated before anything is loaded or hashed, so
/// a request without signature-kind geometry is rejected side-effect-free.
/// An audit append failure after a successful save surfaces as the distinct
/// [`SignError::AuditFailure`] kind rather than a false success.
pub async fn sign<S, E, A>(
    store: &S,
    editor: &E,
    audit: &A,
    request: SignRequest,
) -> Result<SignOutcome, SignError>
where
    S: DocumentStore,
    E: DocumentEditor,
    A: AuditStore,
{
    if request.document_id.trim().is_empty() {
        return Err(SignError::InvalidRequest("missing document id".into()));
    }
    if request.image_encoded.trim().is_empty() {
        return Err(SignError::InvalidRequest(
            "missing signature image payload".into(),
        ));
    }

    let field = request
        .fields
        .iter()
        .find(|f| f.kind == FieldKind::Signature)
        .cloned()
        .ok_or(SignError::MissingSignatureField)?;

    let image = SignatureImage::decode(&request.image_encoded)?;

    let source = store.load(&request.document_id).await?;
    let original_hash = digest(&source);

    let mut handle = editor.open_for_edit(&source)?;
    let page_index = field.page.saturating_sub(1);
    let (page_width, page_height) = editor.page_size(&handle, page_index)?;

    let bx = to_document_box(&field, page_width, page_height);
    let rect = fit(image.width, image.height, &bx)?;

    let image_ref = editor.embed_raster(&mut handle, &image)?;
    editor.draw_image(&mut handle, image_ref, bx.page_index, &rect)?;

    let output = editor.serialize(handle)?;
    let signed_hash = digest(&output);

    let name = format!(
        "signed-{}-{}",
        request.document_id,
        Utc::now().timestamp_millis()
    );
    let stored_location = store.save(&name, &output).await?;

    if let Err(e) = audit
        .append(&request.document_id, &original_hash, &signed_hash)
        .await
    {
        error!(
            document_id = %request.document_id,
            location = %stored_location,
            "audit append failed after successful store"
        );
        return Err(SignError::AuditFailure {
            location: stored_location,
            reason: e.to_string(),
        });
    }

    info!(
        document_id = %request.document_id,
        location = %stored_location,
        "signed document stored and audited"
    );

    Ok(SignOutcome {
        document_id: request.document_id,
        stored_location,
        original_hash,
        signed_hash,
    })
}
