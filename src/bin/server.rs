//! Herdbook reference API server
//!
//! Serves the remote API the `herd` CLI syncs against, keeping all records
//! in memory. Meant for local testing and demos.
//!
//! # Configuration
//!
//! Environment variables:
//! - `HERD_PORT`: Port to listen on (default: 8080)
//! - `HERD_API_TOKEN`: Bearer token required on `/api` routes (default: none)
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `GET|POST /api/animals`, `PUT /api/animals/{id}`
//! - `GET|POST /api/vaccines`, `PUT /api/vaccines/{id}`
//! - `GET /api/dashboard/kpis`
//! - `GET|PUT /api/vaccine-types`

use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use herdbook::server::{router, ServerState};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herdbook=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let port = std::env::var("HERD_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let token = std::env::var("HERD_API_TOKEN")
        .ok()
        .filter(|t| !t.is_empty());

    if token.is_none() {
        tracing::warn!("HERD_API_TOKEN not set - API routes are open");
    }

    let app = router(ServerState::new(token)).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
