//! Output formatting for CLI commands
//!
//! Responses are converted into plain serde views so they can be printed as
//! JSON or YAML.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::provider::v1alpha1::{MountResponse, VersionResponse};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    /// Parse output format from string
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            _ => anyhow::bail!("Unsupported output format: '{}'. Use 'json' or 'yaml'.", s),
        }
    }
}

/// Print data in the specified format
pub fn print_output<T: Serialize>(data: &T, format: &str) -> Result<()> {
    println!("{}", render_output(data, OutputFormat::parse(format)?)?);
    Ok(())
}

pub fn render_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).context("Failed to serialize to JSON")
        }
        OutputFormat::Yaml => serde_yaml::to_string(data).context("Failed to serialize to YAML"),
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct VersionOutput {
    pub version: String,
    pub runtime_name: String,
    pub runtime_version: String,
}

impl From<VersionResponse> for VersionOutput {
    fn from(response: VersionResponse) -> Self {
        Self {
            version: response.version,
            runtime_name: response.runtime_name,
            runtime_version: response.runtime_version,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FileOutput {
    pub path: String,
    pub mode: String,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ObjectVersionOutput {
    pub id: String,
    pub version: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MountOutput {
    pub files: Vec<FileOutput>,
    pub object_versions: Vec<ObjectVersionOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MountOutput {
    pub fn new(response: MountResponse, show_contents: bool) -> Self {
        let files = response
            .files
            .into_iter()
            .map(|file| FileOutput {
                path: file.path,
                mode: format!("{:#o}", file.mode),
                size: file.contents.len(),
                contents: show_contents
                    .then(|| String::from_utf8_lossy(&file.contents).into_owned()),
            })
            .collect();
        let object_versions = response
            .object_version
            .into_iter()
            .map(|v| ObjectVersionOutput { id: v.id, version: v.version })
            .collect();
        let error = response.error.map(|e| e.code).filter(|code| !code.is_empty());

        Self { files, object_versions, error }
    }
}
