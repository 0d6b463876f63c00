//! Companion client for poking a running provider socket.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    csi_debugger::cli::run_cli().await
}
