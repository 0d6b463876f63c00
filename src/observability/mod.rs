//! # Observability
//!
//! Structured logging for the CSI debugger plus the tower layer that gives
//! every gRPC call its own tracing span.

pub mod grpc_tracing;
pub mod logging;

pub use grpc_tracing::GrpcTracingLayer;
pub use logging::{build_env_filter, init_logging};
