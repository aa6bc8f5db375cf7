//! Archive transport for the CVM open-data portal.
//!
//! This crate downloads the public offerings archive and extracts the CSV
//! members the pipeline cares about. It has no knowledge of what the files
//! contain; parsing and diffing live in `cvmstorage`.

pub mod client;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod params;

pub use crate::client::{ArchiveService, HttpArchiveService};
pub use crate::extract::{extract_members, ExtractReport};
pub use crate::fetcher::{ArchiveFetcher, FetchedArchive};
pub use crate::params::ArchiveParams;
