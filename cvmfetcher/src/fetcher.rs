use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    client::{ArchiveService, HttpArchiveService},
    error::Result,
    extract::{extract_members, ExtractReport},
    params::ArchiveParams,
};

/// A downloaded archive together with what was extracted from it.
#[derive(Debug, Clone)]
pub struct FetchedArchive {
    pub archive_path: PathBuf,
    pub bytes: u64,
    pub report: ExtractReport,
}

/// Downloads an archive and extracts the requested members.
pub struct ArchiveFetcher {
    client: Arc<dyn ArchiveService>,
}

impl ArchiveFetcher {
    pub fn new(client: Arc<dyn ArchiveService>) -> Self {
        Self { client }
    }

    pub fn with_default_client(timeout: Duration) -> Result<Self> {
        let client = HttpArchiveService::new(timeout)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Any failure here is a transport failure: nothing downstream should run.
    pub async fn fetch(&self, params: &ArchiveParams) -> Result<FetchedArchive> {
        params.validate()?;
        let archive_path = params.archive_path();
        let bytes = self.client.download(&params.url, &archive_path).await?;

        let members = params.members.clone();
        let dest_dir = params.dest_dir.clone();
        let path = archive_path.clone();
        let report =
            tokio::task::spawn_blocking(move || extract_members(&path, &members, &dest_dir))
                .await??;

        Ok(FetchedArchive {
            archive_path,
            bytes,
            report,
        })
    }
}
