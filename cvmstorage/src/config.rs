use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Deserialize, Debug, Clone)]
pub struct StorageConfig {
    pub download_dir: PathBuf,
    pub history_path: PathBuf,
    pub lock_path: PathBuf,
}

impl StorageConfig {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        Self::with_history(
            base_path.join("dados_cvm_diarios"),
            base_path.join("deb_processadas.csv"),
        )
    }

    /// Builds a config around an explicit history file; the lock file sits
    /// next to it.
    pub fn with_history(download_dir: impl Into<PathBuf>, history_path: impl Into<PathBuf>) -> Self {
        let history_path = history_path.into();
        let mut lock_name = history_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "history".into());
        lock_name.push(".lock");
        Self {
            download_dir: download_dir.into(),
            lock_path: history_path.with_file_name(lock_name),
            history_path,
        }
    }
}

/// Column names and values that drive filtering, diffing and notification.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PipelineSchema {
    pub security_type_column: String,
    pub incentive_column: String,
    pub request_number_column: String,
    pub process_number_column: String,
    pub security_type_value: String,
    pub incentive_value: String,
}

impl Default for PipelineSchema {
    fn default() -> Self {
        Self {
            security_type_column: "Valor_Mobiliario".into(),
            incentive_column: "Titulo_incentivado".into(),
            request_number_column: "Numero_Requerimento".into(),
            process_number_column: "Numero_Processo".into(),
            security_type_value: "Debêntures".into(),
            incentive_value: "S".into(),
        }
    }
}

impl PipelineSchema {
    pub fn key_columns(&self) -> [&str; 2] {
        [
            self.request_number_column.as_str(),
            self.process_number_column.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lays_out_paths_under_base() {
        let config = StorageConfig::new("/srv/cvm");
        assert_eq!(config.download_dir, PathBuf::from("/srv/cvm/dados_cvm_diarios"));
        assert_eq!(config.history_path, PathBuf::from("/srv/cvm/deb_processadas.csv"));
        assert_eq!(config.lock_path, PathBuf::from("/srv/cvm/deb_processadas.csv.lock"));
    }

    #[test]
    fn key_columns_are_request_then_process() {
        let schema = PipelineSchema::default();
        assert_eq!(schema.key_columns(), ["Numero_Requerimento", "Numero_Processo"]);
    }
}
