//! # Error Handling
//!
//! Error types for the CSI debugger, built with `thiserror`.

/// Custom result type for CSI debugger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the CSI debugger
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors (unparseable startup options)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network transport errors (socket, listener, gRPC, HTTP)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Secret store errors
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures raised by the in-memory secret store
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A writer panicked while holding the store lock.
    #[error("secret store lock poisoned during {operation}")]
    Poisoned { operation: &'static str },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error happened before any server loop started serving
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
