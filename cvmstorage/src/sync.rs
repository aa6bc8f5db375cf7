use crate::config::{PipelineSchema, StorageConfig};
use crate::diff::diff;
use crate::errors::Result;
use crate::filter::filter_qualifying;
use crate::lock::HistoryLock;
use crate::merge::{merge, persist};
use crate::models::{ReadOutcome, Table};
use crate::table::read_table;

/// What one pass of the synchronizer saw and did.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub batch_rows: usize,
    pub filtered_rows: usize,
    /// Qualifying rows whose key was absent from history at the start.
    pub delta: Table,
    pub history_rows_before: usize,
    pub history_rows_after: usize,
    pub persisted: bool,
}

/// Owns the on-disk history and runs filter → diff → merge → persist
/// against it.
pub struct HistoryStore {
    config: StorageConfig,
    schema: PipelineSchema,
}

impl HistoryStore {
    pub fn new(config: StorageConfig, schema: PipelineSchema) -> Self {
        Self { config, schema }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn schema(&self) -> &PipelineSchema {
        &self.schema
    }

    /// Current history. Missing and unreadable files both come back as an
    /// empty table.
    pub fn load_history(&self) -> Table {
        match read_table(&self.config.history_path) {
            ReadOutcome::Loaded(table) => table,
            ReadOutcome::Empty(reason) => {
                log::info!("Starting from empty history ({})", reason);
                Table::default()
            }
        }
    }

    /// Computes the delta for `batch` without touching the history file.
    pub fn preview(&self, batch: &Table) -> Result<SyncReport> {
        let filtered = filter_qualifying(batch, &self.schema)?;
        let history = self.load_history();
        let delta = diff(&filtered, &history, &self.schema)?;
        Ok(SyncReport {
            batch_rows: batch.len(),
            filtered_rows: filtered.len(),
            delta,
            history_rows_before: history.len(),
            history_rows_after: history.len(),
            persisted: false,
        })
    }

    /// Filters `batch`, diffs it against history and rewrites history as
    /// their key-deduplicated union. The merge runs even when the delta is
    /// empty.
    ///
    /// Schema failures return before anything is written. The history lock
    /// is held from load to persist.
    pub fn synchronize(&self, batch: &Table) -> Result<SyncReport> {
        let filtered = filter_qualifying(batch, &self.schema)?;

        let _lock = HistoryLock::acquire(&self.config.lock_path)?;
        let history = self.load_history();
        let delta = diff(&filtered, &history, &self.schema)?;

        let merged = merge(&history, &filtered, &self.schema)?;
        persist(&merged, &self.config.history_path)?;

        Ok(SyncReport {
            batch_rows: batch.len(),
            filtered_rows: filtered.len(),
            delta,
            history_rows_before: history.len(),
            history_rows_after: merged.len(),
            persisted: true,
        })
    }
}
