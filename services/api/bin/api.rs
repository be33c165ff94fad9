//! Main Entrypoint for the Tech Resources Bot API
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Loading the topic catalog (built-in unless `TOPICS_PATH` is set).
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use techbot_api::{config::Config, router::create_router, state::AppState};
use techbot_core::{topic::TopicTree, tracker::DialogTracker};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Loading topic catalog...");

    // --- 2. Load Topics ---
    let tree = match &config.topics_path {
        Some(path) => {
            info!(path = %path.display(), "Loading topic catalog from file.");
            TopicTree::from_path(path)
                .with_context(|| format!("Failed to load topics from {}", path.display()))?
        }
        None => TopicTree::default(),
    };
    info!(
        topics = tree.root().children.len(),
        "Topic catalog ready."
    );

    let app_state = Arc::new(AppState {
        tracker: Arc::new(DialogTracker::new(tree)),
        config: Arc::new(config.clone()),
    });

    // --- 3. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 4. Start Server ---
    info!(
        bot_id = %config.bot_id,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
