//! Content-hash audit trail
//!
//! Every successful signing operation appends one immutable record binding
//! the document identifier to digests of the bytes before and after the
//! embed. Records link to their predecessor through `previous_hash`, so a
//! mutated or removed record breaks the chain.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::SignError;
use crate::sign::AuditStore;

/// SHA-256 digest of a byte sequence, hex encoded. Order-dependent over the
/// full sequence, no normalization.
pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// One immutable audit entry. There is no update or delete operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub document_id: String,
    pub original_hash: String,
    pub signed_hash: String,
    pub created_at: DateTime<Utc>,
    /// Entry hash of the preceding record, `None` for the first entry.
    pub previous_hash: Option<String>,
}

impl AuditRecord {
    pub fn new(
        document_id: impl Into<String>,
        original_hash: impl Into<String>,
        signed_hash: impl Into<String>,
        previous_hash: Option<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            original_hash: original_hash.into(),
            signed_hash: signed_hash.into(),
            created_at: Utc::now(),
            previous_hash,
        }
    }

    /// Hash of this record's contents, used to link the next entry.
    pub fn entry_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.document_id.as_bytes());
        hasher.update(self.original_hash.as_bytes());
        hasher.update(self.signed_hash.as_bytes());
        hasher.update(self.created_at.to_rfc3339().as_bytes());
        if let Some(prev) = &self.previous_hash {
            hasher.update(prev.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Verify that every record links to its predecessor's entry hash.
pub fn verify_chain(records: &[AuditRecord]) -> Result<(), String> {
    let mut expected_prev: Option<String> = None;

    for (i, record) in records.iter().enumerate() {
        if record.previous_hash != expected_prev {
            return Err(format!(
                "chain broken at record {}: expected prev {:?}, got {:?}",
                i, expected_prev, record.previous_hash
            ));
        }
        expected_prev = Some(record.entry_hash());
    }

    Ok(())
}

/// In-memory append-only audit store. Linkage to the previous record is
/// handled internally; callers only supply the three digest fields.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().expect("audit log poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("audit log poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditStore for MemoryAuditLog {
    async fn append(
        &self,
        document_id: &str,
        original_hash: &str,
        signed_hash: &str,
    ) -> Result<AuditRecord, SignError> {
        let mut records = self.records.lock().expect("audit log poisoned");
        let previous = records.last().map(|r| r.entry_hash());
        let record = AuditRecord::new(document_id, original_hash, signed_hash, previous);
        records.push(record.clone());
        Ok(record)
    }
}
