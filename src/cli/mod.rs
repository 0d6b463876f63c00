//! # Command Line Interface
//!
//! `csi-debugger-cli` plays the CSI driver's role against a running provider
//! socket, which is handy for checking what a pod would receive without
//! deploying anything.

pub mod client;
pub mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::DEFAULT_SOCKET_PATH;
use crate::provider::PROVIDER_API_VERSION;
use client::ProviderClient;
use output::{print_output, MountOutput, VersionOutput};

#[derive(Parser)]
#[command(name = "csi-debugger-cli")]
#[command(about = "Call a CSI secret provider the way the Secrets Store CSI driver does")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Provider Unix socket
    #[arg(long, global = true, env = "SOCKET_PATH", default_value = DEFAULT_SOCKET_PATH)]
    pub socket: PathBuf,

    /// Output format (json or yaml)
    #[arg(short, long, global = true, default_value = "json")]
    pub output: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Negotiate the provider API version
    Version {
        /// Version the client claims to speak
        #[arg(long, default_value = PROVIDER_API_VERSION)]
        client_version: String,
    },

    /// Request the files a volume mount would receive
    Mount {
        /// Target path reported to the provider
        #[arg(long, default_value = "/tmp/csi-debugger-mount")]
        target_path: String,

        /// Volume attribute as key=value (repeatable)
        #[arg(short, long = "attribute", value_parser = parse_key_val)]
        attributes: Vec<(String, String)>,

        /// Show file contents instead of only their sizes
        #[arg(long)]
        show_contents: bool,
    },
}

/// Parse a `key=value` pair
pub fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) =
        raw.split_once('=').ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    initialise_logging(cli.verbose);

    let mut client = ProviderClient::connect(&cli.socket)
        .await
        .with_context(|| format!("Failed to connect to provider at {}", cli.socket.display()))?;

    match cli.command {
        Commands::Version { client_version } => {
            let response = client.version(&client_version).await?;
            print_output(&VersionOutput::from(response), &cli.output)
        }
        Commands::Mount { target_path, attributes, show_contents } => {
            let response =
                client.mount(&target_path, attributes.into_iter().collect()).await?;
            print_output(&MountOutput::new(response, show_contents), &cli.output)
        }
    }
}

fn initialise_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_env_filter(filter).with_writer(std::io::stderr).finish(),
    );
}
