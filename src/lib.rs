//! # Rambo
//!
//! Backend for a real-estate marketplace: owners list homes to rent or sell,
//! customers browse, bookmark, book viewings, pay rent and rate each other,
//! and both sides talk through property-scoped chat threads.
//!
//! The HTTP API lives under `/api` (see [`routes`]). State is a SQLite pool
//! plus three provider seams in [`providers`]: a mailer for sign-in codes, a
//! payment gateway and a file store for chat attachments.
//!
//! # Running
//!
//! ```sh
//! SEED_DEMO_DATA=true RUST_LOG=info cargo run
//! ```
//!
//! Configuration is read from the environment, see [`config::Config`].

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal::ctrl_c};
use tracing::{info, warn};

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod providers;
pub mod routes;
pub mod seed;
pub mod state;

use config::Config;
use state::AppState;

/// Router with every route and layer attached
pub fn app(state: Arc<AppState>) -> Router {
    routes::router(state)
}

pub async fn serve(config: Config) -> Result<()> {
    info!("Initializing state...");
    let state = AppState::new(config).await?;

    if state.config.seed_demo_data {
        seed::seed_demo_data(&state.db).await?;
    }

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    state.db.close().await;
    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => warn!("Failed to listen for Ctrl+C: {e}"),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
