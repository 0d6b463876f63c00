use std::process;
use std::sync::Arc;

use csi_debugger::{
    app_span, observability::init_logging, Config, SecretStore, Server, APP_NAME, VERSION,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};

/// Exit code for configuration and startup failures
const EXIT_CONFIG: i32 = 1;

/// Exit code for a server loop terminating with an error
const EXIT_SERVER: i32 = 2;

#[tokio::main]
async fn main() {
    // Load .env file if it exists (optional - won't fail if missing)
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to parse config: {}", e);
            process::exit(EXIT_CONFIG);
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("failed to initialise logging: {}", e);
        process::exit(EXIT_CONFIG);
    }

    let span = app_span!();
    let store = match SecretStore::seeded() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(error = %e, "Failed to seed secret store");
            process::exit(EXIT_CONFIG);
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()).instrument(span.clone()));

    let result = Server::new(config, store).run(shutdown).instrument(span).await;

    match result {
        Ok(()) => info!(app_name = APP_NAME, version = VERSION, "debugger shut down gracefully"),
        Err(e) => {
            error!(error = %e, "server group returned an error");
            process::exit(EXIT_SERVER);
        }
    }
}

/// Cancel `shutdown` on SIGINT or SIGTERM
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("received termination signal, starting graceful shutdown"),
        _ = terminate => warn!("received termination signal, starting graceful shutdown"),
        _ = shutdown.cancelled() => return,
    }

    shutdown.cancel();
}
