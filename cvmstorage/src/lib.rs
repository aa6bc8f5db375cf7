//! Incremental history of incentivized debenture offerings.
//!
//! `cvmstorage` turns a freshly downloaded offerings table into the set of
//! offerings not seen on any previous run, and folds the batch into a
//! persisted history file so the next run starts from there:
//! - [`table`] reads and writes the regulator's semicolon-delimited Latin-1 files.
//! - [`filter`] keeps only incentivized debentures.
//! - [`diff`] is a left anti-join on the (request number, process number) key.
//! - [`merge`] unions history and batch, first occurrence wins, and rewrites the file.
//! - [`sync::HistoryStore`] sequences the above under an advisory lock.
//!
//! # Example
//!
//! ```rust,no_run
//! use cvmstorage::{config::{PipelineSchema, StorageConfig}, sync::HistoryStore, table::read_table};
//! use std::path::Path;
//!
//! let store = HistoryStore::new(StorageConfig::new("/var/lib/cvm"), PipelineSchema::default());
//! let batch = read_table(Path::new("/var/lib/cvm/dados_cvm_diarios/oferta_resolucao_160.csv"))
//!     .into_table();
//! let report = store.synchronize(&batch).unwrap();
//! println!("{} new offerings", report.delta.len());
//! ```

pub mod codec;
pub mod config;
pub mod diff;
pub mod errors;
pub mod filter;
pub mod lock;
pub mod merge;
pub mod models;
pub mod sync;
pub mod table;

pub use crate::errors::{Result, StorageError};
pub use crate::models::{EmptyReason, IdentityKey, ReadOutcome, Record, Table, TableSide};
pub use crate::sync::{HistoryStore, SyncReport};
