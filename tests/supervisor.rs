//! Lifecycle tests for running both servers together

use std::sync::Arc;
use std::time::Duration;

use csi_debugger::cli::client::ProviderClient;
use csi_debugger::config::{AdminConfig, ProviderConfig};
use csi_debugger::{Config, SecretStore, Server};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

fn test_config(socket: std::path::PathBuf, port: u16) -> Config {
    Config {
        provider: ProviderConfig { socket_path: socket },
        admin: AdminConfig {
            bind_address: "127.0.0.1".to_string(),
            port,
            shutdown_timeout: Duration::from_secs(1),
        },
        ..Config::default()
    }
}

async fn wait_for_socket(socket: &std::path::Path) -> ProviderClient {
    for _ in 0..100 {
        if socket.exists() {
            if let Ok(client) = ProviderClient::connect(socket).await {
                return client;
            }
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("provider socket {} never became ready", socket.display());
}

#[tokio::test]
async fn cancel_drains_both_servers_and_removes_socket() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("csi").join("provider.sock");
    let store = Arc::new(SecretStore::seeded().unwrap());
    let shutdown = CancellationToken::new();

    let server = Server::new(test_config(socket.clone(), 0), Arc::clone(&store));
    let handle = tokio::spawn(server.run(shutdown.clone()));

    let mut client = wait_for_socket(&socket).await;
    let response = client.mount("/tmp/target", Default::default()).await.unwrap();
    assert_eq!(response.files.len(), 1);
    drop(client);

    shutdown.cancel();
    let result = timeout(Duration::from_secs(10), handle).await.unwrap().unwrap();
    assert!(result.is_ok(), "unexpected error: {:?}", result);
    assert!(!socket.exists());
}

#[tokio::test]
async fn admin_bind_failure_stops_provider() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("provider.sock");
    let shutdown = CancellationToken::new();

    let server = Server::new(test_config(socket.clone(), port), Arc::new(SecretStore::new()));
    let result = timeout(Duration::from_secs(10), server.run(shutdown.clone())).await.unwrap();

    let err = result.expect_err("admin bind should fail");
    assert!(err.to_string().contains("Failed to bind admin server"), "{}", err);
    assert!(shutdown.is_cancelled());
    assert!(!socket.exists());
}
