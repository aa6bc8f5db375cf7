use std::collections::HashSet;

use crate::config::PipelineSchema;
use crate::errors::{Result, StorageError};
use crate::models::{IdentityKey, Record, Table, TableSide};

/// Resolved positions of the identity key columns within one table.
#[derive(Debug, Clone, Copy)]
pub struct KeyColumns {
    request: usize,
    process: usize,
}

impl KeyColumns {
    /// Looks up both key columns, naming the side and column on failure.
    pub fn resolve(table: &Table, schema: &PipelineSchema, side: TableSide) -> Result<Self> {
        let find = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| StorageError::MissingColumn {
                    side,
                    column: column.to_string(),
                })
        };
        Ok(Self {
            request: find(&schema.request_number_column)?,
            process: find(&schema.process_number_column)?,
        })
    }

    pub fn key_of(&self, record: &Record) -> IdentityKey {
        IdentityKey {
            request_number: record.cell(self.request).to_string(),
            process_number: record.cell(self.process).to_string(),
        }
    }
}

/// Resolves the key columns of `table` and checks every row carries both
/// key values.
pub fn checked_keys(table: &Table, schema: &PipelineSchema, side: TableSide) -> Result<KeyColumns> {
    let keys = KeyColumns::resolve(table, schema, side)?;
    for (row_idx, row) in table.rows().iter().enumerate() {
        for (idx, column) in [
            (keys.request, &schema.request_number_column),
            (keys.process, &schema.process_number_column),
        ] {
            if row.cell(idx).is_empty() {
                return Err(StorageError::MissingKeyValue {
                    side,
                    row: row_idx + 1,
                    column: column.clone(),
                });
            }
        }
    }
    Ok(keys)
}

/// Left anti-join of `batch` against `history` on the identity key.
///
/// Rows keep their batch order. Duplicate keys inside the batch are not
/// collapsed here. An empty history makes every batch row new, and its
/// columns are not checked.
pub fn diff(batch: &Table, history: &Table, schema: &PipelineSchema) -> Result<Table> {
    let batch_keys = checked_keys(batch, schema, TableSide::Batch)?;

    let seen: HashSet<IdentityKey> = if history.is_empty() {
        HashSet::new()
    } else {
        let history_keys = checked_keys(history, schema, TableSide::History)?;
        history
            .rows()
            .iter()
            .map(|row| history_keys.key_of(row))
            .collect()
    };

    let mut delta = Table::new(batch.columns().to_vec());
    for row in batch.rows() {
        if !seen.contains(&batch_keys.key_of(row)) {
            delta.push_record(row.clone());
        }
    }

    log::info!("{} new entries detected", delta.len());
    Ok(delta)
}
