use std::collections::HashMap;
use std::fmt;

/// Which input a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSide {
    Batch,
    History,
}

impl fmt::Display for TableSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSide::Batch => f.write_str("batch"),
            TableSide::History => f.write_str("history"),
        }
    }
}

/// One row of the source dataset. Cells line up with the owning table's
/// columns; a missing value is the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    cells: Vec<String>,
}

impl Record {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// A set of records sharing an ordered column schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from string rows, padding short rows with empty cells.
    pub fn from_rows<C, H, R, S>(columns: C, rows: R) -> Self
    where
        C: IntoIterator<Item = H>,
        H: Into<String>,
        R: IntoIterator<Item = Vec<S>>,
        S: Into<String>,
    {
        let mut table = Self::new(columns.into_iter().map(Into::into).collect());
        for row in rows {
            table.push(row.into_iter().map(Into::into).collect());
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Appends a row, padding it to the schema width.
    pub fn push(&mut self, mut cells: Vec<String>) {
        cells.resize(self.columns.len(), String::new());
        self.rows.push(Record::new(cells));
    }

    pub(crate) fn push_record(&mut self, record: Record) {
        self.rows.push(record);
    }

    /// Value of `column` in `row`, if the column exists.
    pub fn value<'a>(&'a self, row: &'a Record, column: &str) -> Option<&'a str> {
        self.column_index(column).map(|idx| row.cell(idx))
    }

    /// Copy of this table holding only the first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Re-expresses every row against `columns`, which must be a superset
    /// of this table's schema. Unmatched cells are left empty.
    pub(crate) fn project_onto(&self, columns: &[String]) -> impl Iterator<Item = Record> + '_ {
        let lookup: HashMap<&str, usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect();
        let mapping: Vec<Option<usize>> = columns
            .iter()
            .map(|name| lookup.get(name.as_str()).copied())
            .collect();
        self.rows.iter().map(move |row| {
            Record::new(
                mapping
                    .iter()
                    .map(|slot| slot.map(|idx| row.cell(idx).to_string()).unwrap_or_default())
                    .collect(),
            )
        })
    }
}

/// The (request number, process number) pair identifying an offering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub request_number: String,
    pub process_number: String,
}

/// Why a read produced no table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    NotFound,
    EmptyFile,
    Unreadable(String),
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::NotFound => f.write_str("file not found"),
            EmptyReason::EmptyFile => f.write_str("file is empty"),
            EmptyReason::Unreadable(msg) => write!(f, "unreadable: {msg}"),
        }
    }
}

/// Result of loading a delimited file. Callers that do not care why a file
/// was empty use [`ReadOutcome::into_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Loaded(Table),
    Empty(EmptyReason),
}

impl ReadOutcome {
    pub fn into_table(self) -> Table {
        match self {
            ReadOutcome::Loaded(table) => table,
            ReadOutcome::Empty(_) => Table::default(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ReadOutcome::Loaded(_))
    }
}
