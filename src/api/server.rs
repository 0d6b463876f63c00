use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::routes::{build_router, AdminState};
use crate::config::AdminConfig;
use crate::errors::Error;
use crate::store::SecretStore;

/// Bind the admin port and serve until `shutdown` is cancelled
pub async fn start_admin_server(
    config: AdminConfig,
    store: Arc<SecretStore>,
    shutdown: CancellationToken,
) -> crate::Result<()> {
    let addr = config.socket_addr()?;
    let state = AdminState::new(store)?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::transport(format!("Failed to bind admin server on {}: {}", addr, e)))?;

    info!(address = %addr, "HTTP admin server listening");
    serve_admin(listener, build_router(state), shutdown, config.shutdown_timeout).await?;

    info!("HTTP admin server shutdown completed");
    Ok(())
}

/// Serve `router` on an already-bound listener
///
/// After `shutdown` fires the server stops accepting connections and waits
/// up to `grace` for in-flight requests before giving up on them.
pub async fn serve_admin(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
    grace: Duration,
) -> crate::Result<()> {
    let signal = shutdown.clone();
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            signal.cancelled().await;
            info!("Shutting down HTTP admin server");
        })
        .into_future();

    tokio::select! {
        result = server => {
            result.map_err(|e| Error::transport(format!("HTTP admin server error: {}", e)))
        }
        _ = drain_deadline(shutdown, grace) => {
            warn!(
                grace_secs = grace.as_secs(),
                "Admin requests still in flight after grace period; abandoning them"
            );
            Ok(())
        }
    }
}

fn drain_deadline(shutdown: CancellationToken, grace: Duration) -> impl Future<Output = ()> {
    async move {
        shutdown.cancelled().await;
        tokio::time::sleep(grace).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serve_admin_stops_on_cancel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let state = AdminState::new(Arc::new(SecretStore::new())).unwrap();
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(serve_admin(
            listener,
            build_router(state),
            shutdown.clone(),
            Duration::from_secs(5),
        ));

        shutdown.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_start_admin_server_reports_bind_failure() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();
        let config = AdminConfig { bind_address: "127.0.0.1".into(), port, ..Default::default() };

        let err = start_admin_server(config, Arc::new(SecretStore::new()), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(msg) if msg.contains("Failed to bind")));
    }
}
