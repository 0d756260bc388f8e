//! Application state: audit database and document directories

use anyhow::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;

pub struct AppState {
    pub db: SqlitePool,
    pub docs_dir: PathBuf,
    pub signed_dir: PathBuf,
}

impl AppState {
    pub async fn new() -> Result<Self> {
        let docs_dir = PathBuf::from(
            std::env::var("FIELDSIGN_DOCS_DIR").unwrap_or_else(|_| "pdfs".to_string()),
        );
        let signed_dir = PathBuf::from(
            std::env::var("FIELDSIGN_SIGNED_DIR").unwrap_or_else(|_| "signed".to_string()),
        );
        std::fs::create_dir_all(&docs_dir)?;
        std::fs::create_dir_all(&signed_dir)?;

        let db_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:fieldsign.db?mode=rwc".to_string());

        tracing::info!("Connecting to audit database: {}", db_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self {
            db: pool,
            docs_dir,
            signed_dir,
        })
    }

    pub(crate) async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        tracing::info!("Running audit log migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                original_hash TEXT NOT NULL,
                signed_hash TEXT NOT NULL,
                previous_hash TEXT,
                entry_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        // Index for per-document history lookups
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_audit_log_document ON audit_log(document_id)
            "#,
        )
        .execute(pool)
        .await?;

        tracing::info!("Migrations complete");
        Ok(())
    }
}
