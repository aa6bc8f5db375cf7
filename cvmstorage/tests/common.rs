use cvmstorage::{
    codec::encode_latin1,
    config::{PipelineSchema, StorageConfig},
    sync::HistoryStore,
    table::read_table,
    Table,
};
use tempfile::TempDir;

pub const COLUMNS: [&str; 5] = [
    "Numero_Requerimento",
    "Numero_Processo",
    "Valor_Mobiliario",
    "Titulo_incentivado",
    "Nome_Emissor",
];

#[allow(dead_code)]
pub struct TestContext {
    pub temp_dir: TempDir,
    pub config: StorageConfig,
    pub store: HistoryStore,
}

impl TestContext {
    #[allow(dead_code)]
    pub fn history(&self) -> Table {
        read_table(&self.config.history_path).into_table()
    }

    #[allow(dead_code)]
    pub fn write_history_raw(&self, text: &str) -> anyhow::Result<()> {
        std::fs::write(&self.config.history_path, encode_latin1(text)?)?;
        Ok(())
    }
}

pub fn init_test_context() -> anyhow::Result<TestContext> {
    let temp_dir = tempfile::tempdir()?;
    let config = StorageConfig::new(temp_dir.path());
    std::fs::create_dir_all(&config.download_dir)?;
    let store = HistoryStore::new(config.clone(), PipelineSchema::default());
    Ok(TestContext {
        temp_dir,
        config,
        store,
    })
}

/// One offering row: (request, process, security type, incentive flag).
pub fn offering(key: (&str, &str), kind: &str, flag: &str) -> Vec<String> {
    vec![
        key.0.to_string(),
        key.1.to_string(),
        kind.to_string(),
        flag.to_string(),
        format!("Emissor {}-{}", key.0, key.1),
    ]
}

pub fn batch(rows: Vec<Vec<String>>) -> Table {
    Table::from_rows(COLUMNS, rows)
}

#[allow(dead_code)]
pub fn keys(table: &Table) -> Vec<(String, String)> {
    let req = table.column_index("Numero_Requerimento").unwrap();
    let process = table.column_index("Numero_Processo").unwrap();
    table
        .rows()
        .iter()
        .map(|r| (r.cell(req).to_string(), r.cell(process).to_string()))
        .collect()
}
