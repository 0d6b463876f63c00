//! # Configuration Management
//!
//! Startup configuration for the CSI debugger, read once from the process
//! environment. Every option has a documented default.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

pub const ENV_SOCKET_PATH: &str = "SOCKET_PATH";
pub const ENV_HTTP_PORT: &str = "HTTP_PORT";
pub const ENV_HTTP_BIND_ADDRESS: &str = "HTTP_BIND_ADDRESS";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
pub const ENV_SHUTDOWN_TIMEOUT_SECONDS: &str = "SHUTDOWN_TIMEOUT_SECONDS";

pub const DEFAULT_SOCKET_PATH: &str = "/tmp/csi-debugger.sock";
pub const DEFAULT_HTTP_PORT: u16 = 8090;
pub const DEFAULT_HTTP_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECONDS: u64 = 5;

/// Application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub admin: AdminConfig,
    pub observability: ObservabilityConfig,
}

/// gRPC provider server configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Unix domain socket the CSI driver connects to
    pub socket_path: PathBuf,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self { socket_path: PathBuf::from(DEFAULT_SOCKET_PATH) }
    }
}

/// Admin HTTP server configuration
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub bind_address: String,
    pub port: u16,
    /// How long in-flight admin requests may run after shutdown is requested
    pub shutdown_timeout: Duration,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_HTTP_BIND_ADDRESS.to_string(),
            port: DEFAULT_HTTP_PORT,
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

impl AdminConfig {
    /// Parse the configured bind address and port into a socket address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| Error::config(format!("Invalid admin address: {}", e)))
    }
}

/// Log verbosity accepted by `LOG_LEVEL`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(Error::config(format!("Invalid log level: '{}'", other))),
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format accepted by `LOG_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(Error::config(format!("Invalid log format: '{}'", other))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: LogLevel::Info, log_format: LogFormat::Text }
    }
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let socket_path = std::env::var(ENV_SOCKET_PATH)
            .unwrap_or_else(|_| DEFAULT_SOCKET_PATH.to_string());
        if socket_path.trim().is_empty() {
            return Err(Error::config("Socket path cannot be empty"));
        }

        let port = std::env::var(ENV_HTTP_PORT)
            .unwrap_or_else(|_| DEFAULT_HTTP_PORT.to_string())
            .trim()
            .parse()
            .map_err(|e| Error::config(format!("Invalid HTTP port: {}", e)))?;

        let bind_address = std::env::var(ENV_HTTP_BIND_ADDRESS)
            .unwrap_or_else(|_| DEFAULT_HTTP_BIND_ADDRESS.to_string());

        let shutdown_timeout_seconds: u64 = std::env::var(ENV_SHUTDOWN_TIMEOUT_SECONDS)
            .unwrap_or_else(|_| DEFAULT_SHUTDOWN_TIMEOUT_SECONDS.to_string())
            .trim()
            .parse()
            .map_err(|e| Error::config(format!("Invalid shutdown timeout: {}", e)))?;

        let log_level = match std::env::var(ENV_LOG_LEVEL) {
            Ok(value) => LogLevel::parse(&value)?,
            Err(_) => LogLevel::Info,
        };
        let log_format = match std::env::var(ENV_LOG_FORMAT) {
            Ok(value) => LogFormat::parse(&value)?,
            Err(_) => LogFormat::Text,
        };

        let config = Self {
            provider: ProviderConfig { socket_path: PathBuf::from(socket_path) },
            admin: AdminConfig {
                bind_address,
                port,
                shutdown_timeout: Duration::from_secs(shutdown_timeout_seconds),
            },
            observability: ObservabilityConfig { log_level, log_format },
        };

        // Surface a bad bind address now rather than when the server starts.
        config.admin.socket_addr()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.socket_path, PathBuf::from("/tmp/csi-debugger.sock"));
        assert_eq!(config.admin.port, 8090);
        assert_eq!(config.admin.bind_address, "0.0.0.0");
        assert_eq!(config.admin.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.observability.log_level, LogLevel::Info);
        assert_eq!(config.observability.log_format, LogFormat::Text);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("INFO").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::parse("debug").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::parse(" Warning ").unwrap(), LogLevel::Warn);
        assert!(LogLevel::parse("verbose").unwrap_err().is_config());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::parse("text").unwrap(), LogFormat::Text);
        assert!(LogFormat::parse("xml").is_err());
    }

    #[test]
    fn test_admin_socket_addr() {
        let admin = AdminConfig { bind_address: "127.0.0.1".into(), ..Default::default() };
        assert_eq!(admin.socket_addr().unwrap().to_string(), "127.0.0.1:8090");

        let admin = AdminConfig { bind_address: "not an address".into(), ..Default::default() };
        assert!(admin.socket_addr().is_err());
    }
}
