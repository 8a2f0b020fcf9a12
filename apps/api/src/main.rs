mod chats;
mod config;
mod conversation;
mod db;
mod errors;
mod feedback;
mod history;
mod inference_client;
mod models;
mod progress;
mod rating;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_support;
mod tutors;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::inference_client::{CompletionBackend, InferenceClient};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tutor API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL (migrations run on connect)
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(db.clone()));

    // Inference backend
    let inference = Arc::new(InferenceClient::new(&config.inference)?);
    if inference.health().await {
        info!("Inference backend reachable at {}", config.inference.base_url);
    } else {
        warn!(
            "Inference backend at {} is not answering; replies will fail until it is",
            config.inference.base_url
        );
    }

    let state = AppState::new(db, store.clone(), store, inference, config.clone());

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
