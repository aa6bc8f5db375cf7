use std::path::Path;
use std::sync::Arc;

use cvmfetcher::{error::FetcherError, ArchiveFetcher};
use cvmstorage::{sync::HistoryStore, table::read_table, ReadOutcome, StorageError, SyncReport, Table};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::AgentConfig;
use crate::notify::{compose_alert, Notifier};

/// Whether a run may write history and send mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Commit,
    DryRun,
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The batch file was missing, empty or unreadable.
    NoData { reason: String },
    /// A required column or key value was absent; nothing was written.
    SchemaFailure { message: String },
    NoNewEntries,
    NewEntries,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub rows_read: usize,
    pub rows_filtered: usize,
    pub new_entries: usize,
    pub history_rows: usize,
    pub persisted: bool,
    pub notified: bool,
}

impl RunReport {
    fn empty(outcome: RunOutcome) -> Self {
        Self {
            outcome,
            rows_read: 0,
            rows_filtered: 0,
            new_entries: 0,
            history_rows: 0,
            persisted: false,
            notified: false,
        }
    }
}

/// Failures that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("archive transport failed: {0}")]
    Transport(#[from] FetcherError),
    #[error("history persistence failed: {0}")]
    Persistence(StorageError),
}

/// Sequences fetch → extract → read → filter → diff → merge/persist →
/// notify for one run.
///
/// History is persisted before the alert is sent. A crash between the two
/// leaves history updated with no alert delivered for those entries.
pub struct Orchestrator {
    config: AgentConfig,
    fetcher: ArchiveFetcher,
    store: HistoryStore,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Orchestrator {
    pub fn new(config: AgentConfig, fetcher: ArchiveFetcher, notifier: Option<Arc<dyn Notifier>>) -> Self {
        let store = HistoryStore::new(config.storage.clone(), config.schema.clone());
        Self {
            config,
            fetcher,
            store,
            notifier,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Full run. Transport failures abort before history is read.
    pub async fn run(&self, mode: RunMode) -> Result<RunReport, RunError> {
        let fetched = self.fetcher.fetch(&self.config.archive_params()).await?;
        info!(
            bytes = fetched.bytes,
            extracted = fetched.report.extracted.len(),
            missing = fetched.report.missing.len(),
            "archive fetched"
        );

        let Some(target) = fetched.report.path_of(&self.config.target_member) else {
            let reason = format!("{} not present in archive", self.config.target_member);
            warn!("{reason}");
            return Ok(RunReport::empty(RunOutcome::NoData { reason }));
        };
        self.process_file(target, mode).await
    }

    /// Runs everything after extraction against a local batch file.
    pub async fn process_file(&self, path: &Path, mode: RunMode) -> Result<RunReport, RunError> {
        let batch = match read_table(path) {
            ReadOutcome::Loaded(table) if !table.is_empty() => table,
            ReadOutcome::Loaded(_) => {
                warn!("CVM CSV {} has no rows", path.display());
                return Ok(RunReport::empty(RunOutcome::NoData {
                    reason: "batch has no rows".into(),
                }));
            }
            ReadOutcome::Empty(reason) => {
                warn!("CVM CSV {} is empty or unreadable: {}", path.display(), reason);
                return Ok(RunReport::empty(RunOutcome::NoData {
                    reason: reason.to_string(),
                }));
            }
        };
        self.process_batch(&batch, mode).await
    }

    pub async fn process_batch(&self, batch: &Table, mode: RunMode) -> Result<RunReport, RunError> {
        let sync = match mode {
            RunMode::Commit => self.store.synchronize(batch),
            RunMode::DryRun => self.store.preview(batch),
        };
        let sync = match sync {
            Ok(sync) => sync,
            Err(err) if err.is_schema_failure() => {
                error!("{err}; run skipped, history left untouched");
                let mut report = RunReport::empty(RunOutcome::SchemaFailure {
                    message: err.to_string(),
                });
                report.rows_read = batch.len();
                return Ok(report);
            }
            Err(err) => return Err(RunError::Persistence(err)),
        };

        let mut report = Self::report_from(&sync);
        if sync.delta.is_empty() {
            info!("No new incentivized debentures found");
            return Ok(report);
        }
        info!(new_entries = sync.delta.len(), "new incentivized debentures found");

        if mode == RunMode::Commit {
            report.notified = self.notify(&sync.delta).await;
        } else {
            info!("Dry run: history not written, no alert sent");
        }
        Ok(report)
    }

    fn report_from(sync: &SyncReport) -> RunReport {
        RunReport {
            outcome: if sync.delta.is_empty() {
                RunOutcome::NoNewEntries
            } else {
                RunOutcome::NewEntries
            },
            rows_read: sync.batch_rows,
            rows_filtered: sync.filtered_rows,
            new_entries: sync.delta.len(),
            history_rows: sync.history_rows_after,
            persisted: sync.persisted,
            notified: false,
        }
    }

    /// Delivery failures are logged and reported as `false`; they never
    /// undo the persisted merge.
    async fn notify(&self, delta: &Table) -> bool {
        let Some(notifier) = &self.notifier else {
            warn!("Notifications disabled; {} new entries not mailed", delta.len());
            return false;
        };
        if self.config.recipients.is_empty() {
            warn!("No recipients configured; {} new entries not mailed", delta.len());
            return false;
        }

        let alert = compose_alert(delta, &self.config.schema, &self.config.link_base_url);
        match notifier
            .send(&alert.subject, &alert.body, &self.config.recipients)
            .await
        {
            Ok(()) => {
                info!("Alert sent to {}", self.config.recipients.join(", "));
                true
            }
            Err(err) => {
                error!("Failed to send alert: {err}");
                false
            }
        }
    }
}
