//! # Secrets Store CSI Provider
//!
//! Implements the `v1alpha1.CSIDriverProvider` gRPC contract the Secrets
//! Store CSI driver calls over a Unix domain socket:
//! - `Version`: protocol negotiation and liveness, independent of the store
//! - `Mount`: the files and object versions to write into the volume
//!
//! `Mount` always answers with the entire store. The request's attributes
//! are decoded for logging only and never used to select secrets.

pub mod server;

pub use server::{serve_provider, start_provider_server};

use std::collections::BTreeMap;
use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{debug, error, info, warn};

use crate::store::{MountSnapshot, SecretStore};

/// Generated protobuf types and gRPC stubs for the provider contract
pub mod v1alpha1 {
    tonic::include_proto!("v1alpha1");
}

use v1alpha1::csi_driver_provider_server::CsiDriverProvider;
use v1alpha1::{MountRequest, MountResponse, VersionRequest, VersionResponse};

/// Driver-to-provider API version served by this provider
pub const PROVIDER_API_VERSION: &str = "v1alpha1";

/// Runtime name reported by `Version`
pub const RUNTIME_NAME: &str = "csi-debugger-provider";

/// Runtime version reported by `Version`
pub const RUNTIME_VERSION: &str = crate::VERSION;

/// gRPC service answering the CSI driver from the shared secret store
#[derive(Debug, Clone)]
pub struct ProviderService {
    store: Arc<SecretStore>,
}

impl ProviderService {
    pub fn new(store: Arc<SecretStore>) -> Self {
        Self { store }
    }

    /// Build the complete mount response from one read of the store
    fn mount_response(&self) -> Result<MountResponse, Status> {
        let snapshot = self.store.files_and_versions().map_err(|e| {
            error!(error = %e, "Failed to read secret store for mount");
            Status::internal(e.to_string())
        })?;
        Ok(snapshot.into())
    }
}

impl From<MountSnapshot> for MountResponse {
    fn from(snapshot: MountSnapshot) -> Self {
        MountResponse {
            object_version: snapshot
                .object_versions
                .into_iter()
                .map(|v| v1alpha1::ObjectVersion { id: v.id, version: v.version })
                .collect(),
            error: None,
            files: snapshot
                .files
                .into_iter()
                .map(|f| v1alpha1::File { path: f.path, mode: f.mode, contents: f.contents })
                .collect(),
        }
    }
}

/// Decode the JSON-encoded volume attributes for logging
///
/// The driver sends a JSON object of strings. An empty payload decodes to an
/// empty map.
pub fn decode_attributes(raw: &str) -> Result<BTreeMap<String, String>, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(raw)
}

#[tonic::async_trait]
impl CsiDriverProvider for ProviderService {
    async fn version(
        &self,
        request: Request<VersionRequest>,
    ) -> Result<Response<VersionResponse>, Status> {
        let request = request.into_inner();
        info!(client_version = %request.version, "Version request received");

        Ok(Response::new(VersionResponse {
            version: PROVIDER_API_VERSION.to_string(),
            runtime_name: RUNTIME_NAME.to_string(),
            runtime_version: RUNTIME_VERSION.to_string(),
        }))
    }

    async fn mount(
        &self,
        request: Request<MountRequest>,
    ) -> Result<Response<MountResponse>, Status> {
        let request = request.into_inner();

        match decode_attributes(&request.attributes) {
            Ok(attributes) => info!(
                target_path = %request.target_path,
                attributes = ?attributes,
                "Mount request received"
            ),
            Err(e) => warn!(
                target_path = %request.target_path,
                error = %e,
                "Mount request received with undecodable attributes; ignoring them"
            ),
        }
        debug!(
            current_objects = request.current_object_version.len(),
            "Currently mounted object versions"
        );

        let response = self.mount_response()?;
        info!(files = response.files.len(), "Returning full secret store to mount");

        Ok(Response::new(response))
    }
}
