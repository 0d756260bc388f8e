//! Capability implementations: filesystem documents, SQLite audit log

use std::path::PathBuf;

use async_trait::async_trait;
use fieldsign_core::{AuditRecord, AuditStore, DocumentStore, SignError};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use uuid::Uuid;

pub use fieldsign_core::is_safe_stem;

/// Source documents live as `{id}.pdf` in one directory; signed artifacts
/// are written to another. Registering a document is dropping a file in the
/// source directory, which is the capability check: there is no hardcoded
/// list of supported ids.
pub struct FsDocumentStore {
    docs_dir: PathBuf,
    signed_dir: PathBuf,
}

impl FsDocumentStore {
    pub fn new(docs_dir: PathBuf, signed_dir: PathBuf) -> Self {
        Self {
            docs_dir,
            signed_dir,
        }
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn load(&self, id: &str) -> Result<Vec<u8>, SignError> {
        if !is_safe_stem(id) {
            return Err(SignError::NotFound(id.to_string()));
        }
        let path = self.docs_dir.join(format!("{}.pdf", id));
        tokio::fs::read(&path)
            .await
            .map_err(|_| SignError::NotFound(id.to_string()))
    }

    async fn save(&self, name: &str, bytes: &[u8]) -> Result<String, SignError> {
        let file_name = format!("{}.pdf", name);
        let path = self.signed_dir.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| SignError::PersistenceFailure(format!("write {}: {}", file_name, e)))?;
        Ok(file_name)
    }
}

/// Append-only audit log in SQLite. Each insert links to the latest
/// record's entry hash; rows are never updated or deleted.
pub struct SqliteAuditStore {
    db: SqlitePool,
    /// An append reads the predecessor and inserts in two statements;
    /// concurrent appends must not observe the same predecessor.
    append_lock: Mutex<()>,
}

impl SqliteAuditStore {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            append_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn append(
        &self,
        document_id: &str,
        original_hash: &str,
        signed_hash: &str,
    ) -> Result<AuditRecord, SignError> {
        let _guard = self.append_lock.lock().await;

        let previous: Option<String> =
            sqlx::query_scalar("SELECT entry_hash FROM audit_log ORDER BY rowid DESC LIMIT 1")
                .fetch_optional(&self.db)
                .await
                .map_err(|e| SignError::PersistenceFailure(format!("audit read: {}", e)))?;

        let record = AuditRecord::new(document_id, original_hash, signed_hash, previous);

        sqlx::query(
            r#"
            INSERT INTO audit_log (id, document_id, original_hash, signed_hash, previous_hash, entry_hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&record.document_id)
        .bind(&record.original_hash)
        .bind(&record.signed_hash)
        .bind(record.previous_hash.as_deref())
        .bind(record.entry_hash())
        .bind(record.created_at.to_rfc3339())
        .execute(&self.db)
        .await
        .map_err(|e| SignError::PersistenceFailure(format!("audit append: {}", e)))?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;

    async fn memory_pool() -> SqlitePool {
        // One connection: sqlx gives every pooled connection its own
        // in-memory database otherwise.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        AppState::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn stored_links(pool: &SqlitePool) -> Vec<(Option<String>, String)> {
        sqlx::query_as("SELECT previous_hash, entry_hash FROM audit_log ORDER BY rowid")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn sequential_appends_link_to_the_latest_entry() {
        let pool = memory_pool().await;
        let store = SqliteAuditStore::new(pool.clone());

        let first = store.append("doc-1", "aaa", "bbb").await.unwrap();
        let second = store.append("doc-1", "bbb", "ccc").await.unwrap();

        assert!(first.previous_hash.is_none());
        assert_eq!(
            second.previous_hash.as_deref(),
            Some(first.entry_hash().as_str())
        );

        let rows = stored_links(&pool).await;
        assert_eq!(rows.len(), 2);
        assert!(rows[0].0.is_none());
        assert_eq!(rows[1].0.as_deref(), Some(rows[0].1.as_str()));
    }

    /// Interleaved appends must never observe the same predecessor: every
    /// stored row links to exactly the entry hash of the row before it.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_keep_the_chain_intact() {
        let pool = memory_pool().await;
        let store = Arc::new(SqliteAuditStore::new(pool.clone()));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append(&format!("doc-{}", i), "aaa", "bbb")
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let rows = stored_links(&pool).await;
        assert_eq!(rows.len(), 8);
        assert!(rows[0].0.is_none());
        for pair in rows.windows(2) {
            assert_eq!(pair[1].0.as_deref(), Some(pair[0].1.as_str()));
        }
    }
}
