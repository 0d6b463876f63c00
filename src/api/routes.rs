use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{
    bulk_import_handler, delete_secret_handler, index_handler, update_secret_handler,
};
use super::render::AdminRenderer;
use crate::store::SecretStore;
use crate::Result;

/// Shared state handed to every admin handler
#[derive(Debug, Clone)]
pub struct AdminState {
    pub store: Arc<SecretStore>,
    pub renderer: Arc<AdminRenderer>,
}

impl AdminState {
    /// Compile the admin templates and wrap the shared store
    pub fn new(store: Arc<SecretStore>) -> Result<Self> {
        Ok(Self { store, renderer: Arc::new(AdminRenderer::new()?) })
    }
}

pub fn build_router(state: AdminState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/update", post(update_secret_handler))
        .route("/delete", post(delete_secret_handler))
        .route("/bulk", post(bulk_import_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
