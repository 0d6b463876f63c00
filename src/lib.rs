//! # CSI Debugger
//!
//! A debugging stand-in for a Secrets Store CSI driver provider. Instead of
//! fetching secrets from a vault it serves whatever an operator has put in
//! an in-memory store, so driver behaviour (mounts, rotation, file modes)
//! can be exercised by hand.
//!
//! ## Architecture
//!
//! ```text
//! Operator ──HTTP──► Admin Surface ──write──► SecretStore ◄──read── Provider ◄──gRPC/UDS── CSI driver
//! ```
//!
//! - **SecretStore**: reader/writer-locked table of secret files
//! - **Provider**: Tonic-based gRPC server implementing `v1alpha1.CSIDriverProvider`
//! - **Admin Surface**: Axum-based HTML UI for editing the store
//!
//! Both servers share one store and one cancellation token; [`Server::run`]
//! waits for both to drain.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use csi_debugger::{Config, Result, SecretStore, Server};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::from_env()?;
//!     let store = Arc::new(SecretStore::seeded()?);
//!     Server::new(config, store).run(CancellationToken::new()).await
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod provider;
pub mod store;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

// Re-export commonly used types
pub use config::Config;
pub use errors::{Error, Result};
pub use store::{SecretRecord, SecretStore};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Supervisor running the provider and admin servers over one shared store
#[derive(Debug)]
pub struct Server {
    config: Config,
    store: Arc<SecretStore>,
}

impl Server {
    pub fn new(config: Config, store: Arc<SecretStore>) -> Self {
        Self { config, store }
    }

    /// Run both servers until `shutdown` is cancelled or one of them fails
    ///
    /// A failing server cancels `shutdown` so its sibling drains too. Both
    /// servers are always awaited; the first error is returned.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!(
            app_name = APP_NAME,
            version = VERSION,
            http_port = self.config.admin.port,
            socket = %self.config.provider.socket_path.display(),
            "Starting CSI debugger"
        );

        let provider_shutdown = shutdown.clone();
        let provider_task = supervise(
            "provider",
            provider::start_provider_server(
                self.config.provider.clone(),
                Arc::clone(&self.store),
                provider_shutdown.cancelled_owned(),
            ),
            shutdown.clone(),
        );

        let admin_task = supervise(
            "admin",
            api::start_admin_server(
                self.config.admin.clone(),
                Arc::clone(&self.store),
                shutdown.clone(),
            ),
            shutdown.clone(),
        );

        let (provider_result, admin_result) =
            tokio::join!(provider_task.in_current_span(), admin_task.in_current_span());

        provider_result.and(admin_result)
    }
}

async fn supervise<F>(name: &'static str, server: F, shutdown: CancellationToken) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    let result = server.await;
    match &result {
        Ok(()) if !shutdown.is_cancelled() => {
            info!(server = name, "Server stopped without a shutdown request; stopping siblings");
            shutdown.cancel();
        }
        Ok(()) => {}
        Err(e) => {
            error!(server = name, error = %e, "Server terminated with error");
            shutdown.cancel();
        }
    }
    result
}
