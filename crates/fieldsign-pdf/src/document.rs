//! PDF document handle: page lookup and true page dimensions

use fieldsign_core::SignError;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// An opened document being edited. Each handle owns its own parsed copy of
/// the source bytes; nothing is shared between signing requests.
pub struct PdfHandle {
    doc: Document,
}

impl PdfHandle {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| SignError::Document(format!("failed to parse PDF: {}", e)))?;
        Ok(Self { doc })
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Object id for a 0-based page index.
    pub fn page_id(&self, page_index: u32) -> Result<ObjectId, SignError> {
        self.doc
            .get_pages()
            .get(&(page_index + 1))
            .copied()
            .ok_or_else(|| SignError::Document(format!("page index {} out of range", page_index)))
    }

    /// True page width and height in document units, read from the page's
    /// MediaBox (walking up the page tree when inherited). A document whose
    /// page has no resolvable MediaBox is rejected rather than assumed to
    /// be any default size.
    pub fn page_size(&self, page_index: u32) -> Result<(f64, f64), SignError> {
        let page_id = self.page_id(page_index)?;
        let rect = self.media_box(page_id)?;
        Ok((rect[2] - rect[0], rect[3] - rect[1]))
    }

    fn media_box(&self, page_id: ObjectId) -> Result<[f64; 4], SignError> {
        let mut current = page_id;

        // Page tree depth is small in practice; the bound guards cycles.
        for _ in 0..32 {
            let dict = self.dict(current)?;
            if let Ok(mb) = dict.get(b"MediaBox") {
                return self.parse_rect(mb);
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => current = *parent,
                _ => break,
            }
        }

        Err(SignError::Document(
            "page has no resolvable MediaBox".into(),
        ))
    }

    fn dict(&self, id: ObjectId) -> Result<&Dictionary, SignError> {
        self.doc
            .get_object(id)
            .and_then(Object::as_dict)
            .map_err(|e| SignError::Document(format!("bad page object: {}", e)))
    }

    fn parse_rect(&self, obj: &Object) -> Result<[f64; 4], SignError> {
        let arr = match obj {
            Object::Array(a) => a,
            Object::Reference(id) => self
                .doc
                .get_object(*id)
                .and_then(Object::as_array)
                .map_err(|e| SignError::Document(format!("bad MediaBox reference: {}", e)))?,
            _ => return Err(SignError::Document("MediaBox is not an array".into())),
        };

        if arr.len() != 4 {
            return Err(SignError::Document(format!(
                "MediaBox has {} elements, expected 4",
                arr.len()
            )));
        }

        let mut values = [0.0f64; 4];
        for (i, item) in arr.iter().enumerate() {
            values[i] = self.number(item)?;
        }
        Ok(values)
    }

    fn number(&self, obj: &Object) -> Result<f64, SignError> {
        match obj {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(r) => Ok(f64::from(*r)),
            Object::Reference(id) => {
                let resolved = self
                    .doc
                    .get_object(*id)
                    .map_err(|e| SignError::Document(format!("bad number reference: {}", e)))?;
                match resolved {
                    Object::Integer(i) => Ok(*i as f64),
                    Object::Real(r) => Ok(f64::from(*r)),
                    _ => Err(SignError::Document("MediaBox entry is not numeric".into())),
                }
            }
            _ => Err(SignError::Document("MediaBox entry is not numeric".into())),
        }
    }

    pub fn into_bytes(mut self) -> Result<Vec<u8>, SignError> {
        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| SignError::Document(format!("failed to serialize PDF: {}", e)))?;
        Ok(out)
    }
}
