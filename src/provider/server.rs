//! Provider gRPC server on a Unix domain socket

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::net::UnixListener;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::transport::Server;
use tracing::{info, warn};

use super::v1alpha1::csi_driver_provider_server::CsiDriverProviderServer;
use super::ProviderService;
use crate::config::ProviderConfig;
use crate::observability::GrpcTracingLayer;
use crate::store::SecretStore;
use crate::{Error, Result};

/// Bind the provider socket and serve until `shutdown_signal` resolves
///
/// A stale socket left by a previous run is removed and the parent directory
/// is created if needed. The socket file is removed again once the server
/// has drained.
pub async fn start_provider_server<F>(
    config: ProviderConfig,
    store: Arc<SecretStore>,
    shutdown_signal: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let socket_path = config.socket_path;
    let listener = bind_socket(&socket_path)?;

    info!(address = %socket_path.display(), "gRPC provider server listening");

    let result = serve_provider(listener, store, shutdown_signal).await;

    if let Err(e) = remove_stale_socket(&socket_path) {
        warn!(error = %e, path = %socket_path.display(), "Failed to remove provider socket");
    }

    result?;
    info!("gRPC provider server shutdown completed");
    Ok(())
}

/// Serve the provider contract on an already-bound listener
pub async fn serve_provider<F>(
    listener: UnixListener,
    store: Arc<SecretStore>,
    shutdown_signal: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let service = ProviderService::new(store);

    Server::builder()
        .layer(GrpcTracingLayer::new())
        .add_service(CsiDriverProviderServer::new(service))
        .serve_with_incoming_shutdown(UnixListenerStream::new(listener), async move {
            shutdown_signal.await;
            info!("Shutting down gRPC provider server");
        })
        .await
        .map_err(|e| Error::transport(format!("gRPC provider server failed: {}", e)))
}

/// Prepare the socket path and bind a listener on it
pub fn bind_socket(socket_path: &Path) -> Result<UnixListener> {
    remove_stale_socket(socket_path)?;

    if let Some(parent) = socket_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::transport(format!(
                "Failed to create socket directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    UnixListener::bind(socket_path).map_err(|e| {
        Error::transport(format!(
            "gRPC server failed to listen on unix socket {}: {}",
            socket_path.display(),
            e
        ))
    })
}

fn remove_stale_socket(socket_path: &Path) -> Result<()> {
    match std::fs::remove_file(socket_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::transport(format!(
            "Failed to remove existing socket {}: {}",
            socket_path.display(),
            e
        ))),
    }
}
