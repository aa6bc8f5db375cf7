use std::path::PathBuf;

use crate::error::{FetcherError, Result};

/// Where to fetch the archive from and what to pull out of it.
#[derive(Debug, Clone)]
pub struct ArchiveParams {
    pub url: String,
    /// Directory that receives both the archive and the extracted members.
    pub dest_dir: PathBuf,
    /// File name the archive is saved under inside `dest_dir`.
    pub archive_name: String,
    pub members: Vec<String>,
}

impl ArchiveParams {
    pub fn archive_path(&self) -> PathBuf {
        self.dest_dir.join(&self.archive_name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(FetcherError::InvalidParam("archive url is empty".into()));
        }
        if self.archive_name.trim().is_empty() {
            return Err(FetcherError::InvalidParam("archive name is empty".into()));
        }
        if self.members.is_empty() {
            return Err(FetcherError::InvalidParam(
                "at least one archive member must be requested".into(),
            ));
        }
        Ok(())
    }
}
