use crate::config::PipelineSchema;
use crate::errors::{Result, StorageError};
use crate::models::{Table, TableSide};

/// Keeps the rows whose security type and incentive flag both match the
/// schema's values exactly. Cell values are compared as-is, with no
/// trimming or case folding.
///
/// A missing filter column is a schema failure for the whole run.
pub fn filter_qualifying(table: &Table, schema: &PipelineSchema) -> Result<Table> {
    let type_idx = require_column(table, &schema.security_type_column)?;
    let flag_idx = require_column(table, &schema.incentive_column)?;

    let mut filtered = Table::new(table.columns().to_vec());
    for row in table.rows() {
        if row.cell(type_idx) == schema.security_type_value
            && row.cell(flag_idx) == schema.incentive_value
        {
            filtered.push_record(row.clone());
        }
    }

    log::info!(
        "{} of {} rows are incentivized debenture offerings",
        filtered.len(),
        table.len()
    );
    Ok(filtered)
}

fn require_column(table: &Table, column: &str) -> Result<usize> {
    table.column_index(column).ok_or_else(|| StorageError::MissingColumn {
        side: TableSide::Batch,
        column: column.to_string(),
    })
}
