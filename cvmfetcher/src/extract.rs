use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{FetcherError, Result};

/// Outcome of pulling named members out of an archive.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    pub extracted: Vec<PathBuf>,
    pub missing: Vec<String>,
}

impl ExtractReport {
    pub fn path_of(&self, member: &str) -> Option<&Path> {
        self.extracted
            .iter()
            .find(|path| path.file_name().and_then(|n| n.to_str()) == Some(member))
            .map(PathBuf::as_path)
    }
}

/// Extracts each of `members` from the zip at `archive` into `dest_dir`.
///
/// Members absent from the archive are logged and listed in the report;
/// they do not fail the call. A corrupt archive does.
pub fn extract_members(archive: &Path, members: &[String], dest_dir: &Path) -> Result<ExtractReport> {
    log::info!("Extracting {} member(s) from {}", members.len(), archive.display());
    let mut zip = zip::ZipArchive::new(File::open(archive)?)?;
    std::fs::create_dir_all(dest_dir)?;

    let mut report = ExtractReport::default();
    for member in members {
        // Only the final component is used so a member name can never
        // escape `dest_dir`.
        let file_name = Path::new(member).file_name().ok_or_else(|| {
            FetcherError::InvalidParam(format!("member '{member}' has no file name"))
        })?;

        let mut entry = match zip.by_name(member) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => {
                log::warn!("Member '{}' not found in {}", member, archive.display());
                report.missing.push(member.clone());
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let target = dest_dir.join(file_name);
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        log::info!("Extracted {}", target.display());
        report.extracted.push(target);
    }

    Ok(report)
}
