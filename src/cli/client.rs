//! gRPC client for the provider socket.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tonic::transport::{Channel, Endpoint, Uri};
use tracing::debug;

use crate::provider::v1alpha1::csi_driver_provider_client::CsiDriverProviderClient;
use crate::provider::v1alpha1::{MountRequest, MountResponse, VersionRequest, VersionResponse};

/// Default permission string the CSI driver sends with mount requests
pub const DEFAULT_PERMISSION: &str = "420";

/// Thin wrapper over the generated client, connected through a Unix socket
#[derive(Debug, Clone)]
pub struct ProviderClient {
    inner: CsiDriverProviderClient<Channel>,
}

impl ProviderClient {
    pub async fn connect(socket: &Path) -> Result<Self> {
        let channel = connect_channel(socket).await?;
        Ok(Self { inner: CsiDriverProviderClient::new(channel) })
    }

    pub async fn version(&mut self, client_version: &str) -> Result<VersionResponse> {
        debug!(client_version, "sending Version request");
        let response = self
            .inner
            .version(VersionRequest { version: client_version.to_string() })
            .await
            .context("Version call failed")?;
        Ok(response.into_inner())
    }

    pub async fn mount(
        &mut self,
        target_path: &str,
        attributes: BTreeMap<String, String>,
    ) -> Result<MountResponse> {
        let request = MountRequest {
            attributes: serde_json::to_string(&attributes)
                .context("Failed to encode mount attributes")?,
            secrets: "{}".to_string(),
            target_path: target_path.to_string(),
            permission: DEFAULT_PERMISSION.to_string(),
            current_object_version: Vec::new(),
        };
        debug!(target_path, attribute_count = attributes.len(), "sending Mount request");
        let response = self.inner.mount(request).await.context("Mount call failed")?;
        Ok(response.into_inner())
    }
}

/// Open a tonic channel over a Unix domain socket. The URI is a placeholder
/// required by the endpoint builder and is never resolved.
pub async fn connect_channel(socket: &Path) -> Result<Channel> {
    let socket: PathBuf = socket.to_path_buf();
    let channel = Endpoint::try_from("http://[::]:50051")?
        .connect_with_connector(tower::service_fn(move |_: Uri| {
            let socket = socket.clone();
            async move { Ok::<_, std::io::Error>(TokioIo::new(UnixStream::connect(socket).await?)) }
        }))
        .await?;
    Ok(channel)
}
