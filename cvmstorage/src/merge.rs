use std::collections::HashSet;
use std::path::Path;

use crate::config::PipelineSchema;
use crate::diff::KeyColumns;
use crate::errors::Result;
use crate::models::{Table, TableSide};
use crate::table::write_table;

/// History ∪ batch, deduplicated by identity key.
///
/// History rows come first so that on a key collision the earliest-seen
/// row wins. The schema is the union of both column sets in first-seen
/// order; cells a row never had are left empty.
pub fn merge(history: &Table, batch: &Table, schema: &PipelineSchema) -> Result<Table> {
    let mut columns: Vec<String> = history.columns().to_vec();
    for column in batch.columns() {
        if !columns.contains(column) {
            columns.push(column.clone());
        }
    }

    let mut merged = Table::new(columns);
    let keys = KeyColumns::resolve(&merged, schema, TableSide::Batch)?;
    let mut seen = HashSet::with_capacity(history.len() + batch.len());

    let candidates = history
        .project_onto(merged.columns())
        .chain(batch.project_onto(merged.columns()))
        .collect::<Vec<_>>();
    for record in candidates {
        if seen.insert(keys.key_of(&record)) {
            merged.push_record(record);
        }
    }

    Ok(merged)
}

/// Overwrites the history file with `history`.
pub fn persist(history: &Table, path: &Path) -> Result<()> {
    write_table(history, path)?;
    log::info!(
        "History file {} updated with {} entries",
        path.display(),
        history.len()
    );
    Ok(())
}
