//! lopdf-backed document editor for the signing engine
//!
//! Implements [`fieldsign_core::DocumentEditor`] over [`lopdf::Document`]:
//! true page dimensions from the MediaBox, raster XObject embedding (PNG
//! with FlateDecode and an SMask for alpha, JPEG passed through as
//! DCTDecode), and drawing at an absolute rectangle by appending a content
//! stream to the target page.

mod document;
mod embed;

pub use document::PdfHandle;

use fieldsign_core::{DocumentEditor, FittedRect, SignError, SignatureImage};
use lopdf::ObjectId;

/// Stateless editor; all per-document state lives in the [`PdfHandle`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfEditor;

impl PdfEditor {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentEditor for PdfEditor {
    type Handle = PdfHandle;
    type ImageRef = ObjectId;

    fn open_for_edit(&self, bytes: &[u8]) -> Result<PdfHandle, SignError> {
        PdfHandle::from_bytes(bytes)
    }

    fn page_size(&self, handle: &PdfHandle, page_index: u32) -> Result<(f64, f64), SignError> {
        handle.page_size(page_index)
    }

    fn embed_raster(
        &self,
        handle: &mut PdfHandle,
        image: &SignatureImage,
    ) -> Result<ObjectId, SignError> {
        embed::embed_raster(handle.doc_mut(), image)
    }

    fn draw_image(
        &self,
        handle: &mut PdfHandle,
        image: ObjectId,
        page_index: u32,
        rect: &FittedRect,
    ) -> Result<(), SignError> {
        let page_id = handle.page_id(page_index)?;
        embed::draw_image(handle.doc_mut(), page_id, image, rect)
    }

    fn serialize(&self, handle: PdfHandle) -> Result<Vec<u8>, SignError> {
        handle.into_bytes()
    }
}
