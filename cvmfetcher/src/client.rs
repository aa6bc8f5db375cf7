use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{FetcherError, Result};

/// Fetches a remote archive onto local disk.
#[async_trait]
pub trait ArchiveService: Send + Sync {
    /// Downloads `url` into `dest`, replacing any previous file, and returns
    /// the number of bytes written. Non-success statuses are errors.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// `reqwest`-backed implementation with a whole-request timeout.
#[derive(Clone, Debug)]
pub struct HttpArchiveService {
    http_client: reqwest::Client,
}

impl HttpArchiveService {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl ArchiveService for HttpArchiveService {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        log::info!("Downloading archive from {}", url);
        let mut response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetcherError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        log::info!("Archive saved to {} ({} bytes)", dest.display(), written);
        Ok(written)
    }
}
