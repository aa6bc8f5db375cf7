//! Semicolon-delimited, Latin-1 encoded table files.

use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::codec::{decode_latin1, encode_latin1};
use crate::errors::{Result, StorageError};
use crate::models::{EmptyReason, ReadOutcome, Table};

pub const DELIMITER: u8 = b';';

/// Loads `path` into a [`Table`]. Never fails: a missing, empty or
/// malformed file yields [`ReadOutcome::Empty`] with the reason logged.
pub fn read_table(path: &Path) -> ReadOutcome {
    let outcome = match std::fs::read(path) {
        Ok(bytes) => parse_table(&bytes),
        Err(err) if err.kind() == ErrorKind::NotFound => ReadOutcome::Empty(EmptyReason::NotFound),
        Err(err) => ReadOutcome::Empty(EmptyReason::Unreadable(err.to_string())),
    };

    match &outcome {
        ReadOutcome::Loaded(table) => log::info!(
            "Read {} rows ({} columns) from {}",
            table.len(),
            table.columns().len(),
            path.display()
        ),
        ReadOutcome::Empty(EmptyReason::Unreadable(msg)) => {
            log::error!("Failed to read CSV {}: {}", path.display(), msg)
        }
        ReadOutcome::Empty(reason) => log::warn!("No table at {}: {}", path.display(), reason),
    }
    outcome
}

/// Parses raw file bytes. Column names are trimmed; cell values are not.
pub fn parse_table(bytes: &[u8]) -> ReadOutcome {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return ReadOutcome::Empty(EmptyReason::EmptyFile);
    }
    match try_parse(&decode_latin1(bytes)) {
        Ok(outcome) => outcome,
        Err(err) => ReadOutcome::Empty(EmptyReason::Unreadable(err.to_string())),
    }
}

fn try_parse(text: &str) -> Result<ReadOutcome> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|name| name.trim().to_string())
        .collect();
    if columns.is_empty() {
        return Ok(ReadOutcome::Empty(EmptyReason::EmptyFile));
    }

    let mut table = Table::new(columns);
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > table.columns().len() {
            return Ok(ReadOutcome::Empty(EmptyReason::Unreadable(format!(
                "expected {} fields in data row {}, saw {}",
                table.columns().len(),
                idx + 1,
                record.len()
            ))));
        }
        table.push(record.iter().map(str::to_string).collect());
    }
    Ok(ReadOutcome::Loaded(table))
}

/// Serialises `table` with the same delimiter and encoding the reader
/// expects: header row, no index column.
pub fn encode_table(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.cells())?;
    }
    let buffer = writer
        .into_inner()
        .map_err(|err| StorageError::Io(err.into_error()))?;
    let text = String::from_utf8(buffer).map_err(|err| StorageError::Encoding(err.to_string()))?;
    encode_latin1(&text)
}

/// Replaces `path` with `table`. The new content is written to a sibling
/// temp file first and renamed into place.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    let bytes = encode_table(table)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    log::debug!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
