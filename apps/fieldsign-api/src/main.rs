//! Fieldsign API server
//!
//! Thin HTTP adapter around the signing engine:
//! - source document delivery
//! - signing with a placed signature field
//! - signed artifact delivery

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod handlers;
mod models;
mod state;
mod stores;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fieldsign_api=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Initializing fieldsign API...");
    let state = AppState::new().await?;
    let state = Arc::new(state);

    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handlers::health))
        // Source document delivery
        .route("/pdf/:id", get(handlers::get_document))
        // Signed artifact delivery
        .route("/pdf/signed/:name", get(handlers::get_signed))
        // Signing
        .route("/sign-pdf", post(handlers::sign_pdf))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5001);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting fieldsign API on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
