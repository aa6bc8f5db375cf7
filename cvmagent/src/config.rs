use std::path::{Path, PathBuf};
use std::time::Duration;

use cvmstorage::config::{PipelineSchema, StorageConfig};

pub const DEFAULT_ARCHIVE_URL: &str =
    "https://dados.cvm.gov.br/dados/OFERTA/DISTRIB/DADOS/oferta_distribuicao.zip";
pub const DEFAULT_LINK_BASE_URL: &str = "https://web.cvm.gov.br/sre-publico-cvm/#/oferta-publica/";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

const ARCHIVE_NAME: &str = "oferta_distribuicao.zip";
const ARCHIVE_MEMBERS: [&str; 2] = ["oferta_distribuicao.csv", "oferta_resolucao_160.csv"];
const TARGET_MEMBER: &str = "oferta_resolucao_160.csv";

/// Authenticated submission settings for outbound alerts.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("sender", &self.sender)
            .finish()
    }
}

/// Everything one run needs. Built from CLI flags and environment, never
/// from constants holding secrets.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub archive_url: String,
    pub archive_name: String,
    pub archive_members: Vec<String>,
    /// Member whose rows feed the pipeline.
    pub target_member: String,
    pub fetch_timeout: Duration,
    pub link_base_url: String,
    pub storage: StorageConfig,
    pub schema: PipelineSchema,
    pub smtp: Option<SmtpSettings>,
    pub recipients: Vec<String>,
}

impl AgentConfig {
    /// Defaults for the public CVM dataset, storing data under `base_path`.
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            archive_name: ARCHIVE_NAME.to_string(),
            archive_members: ARCHIVE_MEMBERS.iter().map(|m| m.to_string()).collect(),
            target_member: TARGET_MEMBER.to_string(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            link_base_url: DEFAULT_LINK_BASE_URL.to_string(),
            storage: StorageConfig::new(base_path.as_ref()),
            schema: PipelineSchema::default(),
            smtp: None,
            recipients: Vec::new(),
        }
    }

    pub fn target_path(&self) -> PathBuf {
        self.storage.download_dir.join(&self.target_member)
    }

    pub fn archive_params(&self) -> cvmfetcher::ArchiveParams {
        cvmfetcher::ArchiveParams {
            url: self.archive_url.clone(),
            dest_dir: self.storage.download_dir.clone(),
            archive_name: self.archive_name.clone(),
            members: self.archive_members.clone(),
        }
    }

    pub fn notifications_enabled(&self) -> bool {
        self.smtp.is_some() && !self.recipients.is_empty()
    }
}
