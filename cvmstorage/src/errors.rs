use std::path::PathBuf;

use thiserror::Error;

use crate::models::TableSide;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Column '{column}' not found in {side} data")]
    MissingColumn { side: TableSide, column: String },

    #[error("Key column '{column}' is empty at row {row} of {side} data")]
    MissingKeyValue {
        side: TableSide,
        row: usize,
        column: String,
    },

    #[error("History is locked by another run: {0}")]
    LockHeld(PathBuf),

    #[error("Failed to replace history file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl StorageError {
    /// Schema failures stop the run's output but are not process-level faults.
    pub fn is_schema_failure(&self) -> bool {
        matches!(
            self,
            StorageError::MissingColumn { .. } | StorageError::MissingKeyValue { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
