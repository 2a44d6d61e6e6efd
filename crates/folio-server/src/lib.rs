//! HTTP server for the Folio catalog.
//!
//! This crate serves the catalog over HTTP using axum:
//! - OPDS feeds (`/`, `/catalog/{name}`, `/search`, `/book`)
//! - Sidecar downloads (`/get/{books,covers,thumbs}/{id}`)
//! - JSON administration of books and feeds (`/api/...`)
//!
//! It also runs the auto-add watcher, which ingests EPUB files dropped into
//! a configured directory.
//!
//! # Architecture
//!
//! ```text
//! Reader app ──HTTP──► axum router (folio-server)
//!                          │
//!                          └─► Direct call ──► Catalog (store lock) ──► redb
//!
//! inbox/*.epub ──notify──► IngestWatcher ──spawn_blocking──► Catalog::add_book
//! ```

mod app;
mod error;
mod handlers;
mod ingest;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use folio_catalog::Catalog;

pub use app::create_router;
pub use error::ServerError;
pub use ingest::{IngestOptions, IngestOutcome, IngestWatcher, SourceOpener, ingest_file};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Entries per page when a request gives no `count` (0 = unpaginated).
    pub page_size: usize,
    /// Application version (for `ETag` computation).
    pub version: String,
    /// Auto-add watcher settings (`None` disables the watcher).
    pub autoadd: Option<IngestOptions>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
            page_size: 0,
            version: String::new(),
            autoadd: None,
        }
    }
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the watcher or the listener fails to start.
pub async fn run_server(
    config: ServerConfig,
    catalog: Arc<Catalog>,
    opener: SourceOpener,
) -> Result<(), Box<dyn std::error::Error>> {
    // Kept alive for the lifetime of the server.
    let _watcher = match &config.autoadd {
        Some(options) => {
            let mut watcher = IngestWatcher::new(options.clone(), Arc::clone(&catalog), opener);
            watcher.start()?;
            Some(watcher)
        }
        None => None,
    };

    let app = create_router(catalog, &config);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot install Ctrl-C handler, running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from Folio config.
#[must_use]
pub fn server_config_from_folio_config(
    config: &folio_config::Config,
    version: String,
) -> ServerConfig {
    let library = &config.library_resolved;
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        page_size: library.page_size,
        version,
        autoadd: library.autoadd_dir.as_ref().map(|dir| IngestOptions {
            dir: dir.clone(),
            settle_delay: library.settle_delay,
            remove_after_import: library.remove_after_import,
        }),
    }
}
