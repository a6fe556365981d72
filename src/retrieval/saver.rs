//! Resource saving
//!
//! This module defines the save collaborator used by the retrieval queue and a
//! filesystem implementation that downloads over HTTP.

use crate::config::Config;
use crate::crawler::build_http_client;
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Collaborator that persists one resource under a given filename
#[async_trait]
pub trait ResourceSaver: Send + Sync {
    /// Retrieves `url` and stores it as `file_name`
    async fn save(&self, url: &str, file_name: &str) -> Result<(), HarvestError>;
}

/// Downloads resources into a directory
///
/// The body is streamed into `<file_name>.part` and renamed once complete, so an
/// interrupted download never leaves a file under its final name.
#[derive(Debug, Clone)]
pub struct FileSaver {
    client: Client,
    output_dir: PathBuf,
}

impl FileSaver {
    /// Creates a saver writing into `output_dir`
    pub fn new(client: Client, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
        }
    }

    /// Creates a saver from the full configuration, sharing its session context
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.user_agent, config.session.as_ref())?;
        Ok(Self::new(client, config.retrieval.output_dir.clone()))
    }

    /// Returns the directory files are written into
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl ResourceSaver for FileSaver {
    async fn save(&self, url: &str, file_name: &str) -> Result<(), HarvestError> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Retrieval {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let final_path = self.output_dir.join(file_name);
        let part_path = self.output_dir.join(format!("{}.part", file_name));

        let written = match write_part(&mut response, &part_path).await {
            Ok(written) => written,
            Err(e) => {
                match tokio::fs::remove_file(&part_path).await {
                    Err(remove_err) if remove_err.kind() != std::io::ErrorKind::NotFound => {
                        tracing::warn!("Failed to remove {}: {}", part_path.display(), remove_err);
                    }
                    _ => {}
                }
                return Err(e);
            }
        };

        tokio::fs::rename(&part_path, &final_path).await?;
        tracing::debug!("Wrote {} bytes to {}", written, final_path.display());

        Ok(())
    }
}

/// Streams the response body into `part_path`, returning the byte count
async fn write_part(response: &mut Response, part_path: &Path) -> Result<u64, HarvestError> {
    let mut file = tokio::fs::File::create(part_path).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
