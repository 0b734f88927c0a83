//! # relayhubd — relayhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialise `tracing` from the configured filter
//! - Open the relay backend and drive every relay open
//! - Construct the relay service, injecting the backend via the port trait
//! - Build the axum router, injecting the service
//! - Bind to a TCP port and serve
//! - On SIGINT/SIGTERM stop accepting requests, cancel running operations
//!   and wait until every relay is open again
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod relays;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use relayhub_adapter_http_axum::router;
use relayhub_adapter_http_axum::state::AppState;
use relayhub_app::services::relay_service::RelayService;

use crate::config::Config;
use crate::relays::RelayBackend;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Relays
    let devices = config.devices()?;
    let backend = Arc::new(RelayBackend::open(&config, &devices)?);

    // Services
    let service = Arc::new(RelayService::new(
        devices.clone(),
        Arc::clone(&backend),
        config.timing_settings(),
    )?);

    // HTTP
    let app = router::build(AppState::from_arc(Arc::clone(&service)));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "relayhubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.shutdown().await;
    backend.open_all(&devices);
    tracing::info!("relayhubd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
