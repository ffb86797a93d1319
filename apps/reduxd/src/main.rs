//! Softcore Redux Daemon
//!
//! The only process that writes config files. Editors connect over TCP and
//! ask it to load, patch or save documents.

mod logging;
mod server;

use redux_core::DocumentService;
use redux_settings::{LoggingSettings, Settings};
use server::DaemonServer;
use std::error::Error;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let settings = match Settings::load().await {
        Ok(settings) => settings,
        Err(e) => {
            let _guard = logging::init(&LoggingSettings::default())?;
            error!("Failed to load settings: {}", e);
            return Err(e.into());
        }
    };
    let _log_guard = logging::init(&settings.logging)?;

    info!(
        "Starting Softcore Redux daemon v{}",
        env!("CARGO_PKG_VERSION")
    );

    let service = DocumentService::from_settings(&settings)?;
    info!(
        "Auto-load document: {}",
        service.default_document().display()
    );

    let server = DaemonServer::bind(&settings.daemon, service).await?;
    info!("IPC server listening on {}", server.local_addr()?);

    let server_task = tokio::spawn(server.run());

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, initiating graceful shutdown...");
        }
        result = server_task => {
            if let Err(e) = result {
                error!("IPC server task failed: {}", e);
            }
        }
    }

    info!("Softcore Redux daemon shutdown completed");
    Ok(())
}
