//! # Admin Surface
//!
//! HTTP interface for operators and tests to inspect and edit the secret
//! store: an HTML listing plus form endpoints for update, delete and bulk
//! import. Successful mutations redirect back to the listing.

pub mod error;
pub mod handlers;
pub mod render;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{build_router, AdminState};
pub use server::{serve_admin, start_admin_server};
