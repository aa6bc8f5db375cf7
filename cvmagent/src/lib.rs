pub mod config;
pub mod notify;
pub mod orchestrator;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use cvmfetcher::ArchiveFetcher;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{
    AgentConfig, SmtpSettings, DEFAULT_ARCHIVE_URL, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_LINK_BASE_URL, DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT,
};
use crate::notify::{Notifier, SmtpNotifier};
use crate::orchestrator::{Orchestrator, RunMode, RunReport};

pub use crate::orchestrator::{RunError, RunOutcome};

/// Runs the command line interface for the CVM offerings watcher.
pub async fn run_cli() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Run(args)) => execute(args, None).await?,
        Some(Command::Process(args)) => execute(args.common, Some(args.input)).await?,
        None => {
            println!("No subcommand provided. Use --help to see available commands.");
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Downloads the CVM archive, records new offerings and mails an alert
    Run(CommonArgs),
    /// Processes a local offerings CSV instead of downloading the archive
    Process(ProcessArgs),
}

#[derive(Args)]
struct ProcessArgs {
    /// Semicolon-delimited Latin-1 offerings file
    #[arg(long)]
    input: PathBuf,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct CommonArgs {
    /// Base directory for downloads and the history file
    #[arg(long, env = "CVM_BASE_PATH", default_value = ".")]
    base_path: PathBuf,
    /// History file location (defaults to <base_path>/deb_processadas.csv)
    #[arg(long, env = "CVM_HISTORY_PATH")]
    history_path: Option<PathBuf>,
    /// Offerings archive URL
    #[arg(long, env = "CVM_ARCHIVE_URL", default_value = DEFAULT_ARCHIVE_URL)]
    archive_url: String,
    /// Download timeout in seconds
    #[arg(long, env = "CVM_FETCH_TIMEOUT_SECS", default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    fetch_timeout_secs: u64,
    /// Prefix for offering links in alerts
    #[arg(long, env = "CVM_LINK_BASE_URL", default_value = DEFAULT_LINK_BASE_URL)]
    link_base_url: String,
    #[arg(long, env = "SMTP_HOST", default_value = DEFAULT_SMTP_HOST)]
    smtp_host: String,
    #[arg(long, env = "SMTP_PORT", default_value_t = DEFAULT_SMTP_PORT)]
    smtp_port: u16,
    #[arg(long, env = "SMTP_USERNAME")]
    smtp_username: Option<String>,
    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    smtp_password: Option<String>,
    /// Sender address (defaults to the SMTP username)
    #[arg(long, env = "MAIL_FROM")]
    mail_from: Option<String>,
    /// Comma-separated recipient list
    #[arg(long, env = "MAIL_TO", value_delimiter = ',')]
    mail_to: Vec<String>,
    /// Compute new entries without writing history or sending mail
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Print the run report as JSON on stdout
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl CommonArgs {
    fn to_config(&self) -> AgentConfig {
        let mut config = AgentConfig::new(&self.base_path);
        if let Some(history_path) = &self.history_path {
            config.storage = cvmstorage::config::StorageConfig::with_history(
                config.storage.download_dir.clone(),
                history_path,
            );
        }
        config.archive_url = self.archive_url.clone();
        config.fetch_timeout = Duration::from_secs(self.fetch_timeout_secs);
        config.link_base_url = self.link_base_url.clone();
        config.recipients = self
            .mail_to
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        config.smtp = match (&self.smtp_username, &self.smtp_password) {
            (Some(username), Some(password)) => Some(SmtpSettings {
                host: self.smtp_host.clone(),
                port: self.smtp_port,
                username: username.clone(),
                password: password.clone(),
                sender: self.mail_from.clone().unwrap_or_else(|| username.clone()),
            }),
            _ => None,
        };
        config
    }

    fn mode(&self) -> RunMode {
        if self.dry_run {
            RunMode::DryRun
        } else {
            RunMode::Commit
        }
    }
}

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

fn build_notifier(config: &AgentConfig) -> Option<Arc<dyn Notifier>> {
    let Some(settings) = &config.smtp else {
        warn!("SMTP credentials not configured; alerts are disabled");
        return None;
    };
    if config.recipients.is_empty() {
        warn!("MAIL_TO is empty; alerts are disabled");
        return None;
    }
    match SmtpNotifier::new(settings) {
        Ok(notifier) => Some(Arc::new(notifier)),
        Err(err) => {
            error!("Failed to initialize SMTP notifier: {}", err);
            None
        }
    }
}

async fn execute(args: CommonArgs, input: Option<PathBuf>) -> anyhow::Result<()> {
    let config = args.to_config();
    let mode = args.mode();
    let fetcher = ArchiveFetcher::with_default_client(config.fetch_timeout)
        .context("failed to build HTTP client")?;
    let notifier = build_notifier(&config);
    let orchestrator = Orchestrator::new(config, fetcher, notifier);

    let result = match &input {
        Some(path) => orchestrator.process_file(path, mode).await,
        None => orchestrator.run(mode).await,
    };

    match result {
        Ok(report) => {
            log_report(&report);
            if args.json {
                println!("{}", serde_json::to_string(&report)?);
            }
            Ok(())
        }
        Err(err) => {
            error!("FATAL: {err}");
            Err(err.into())
        }
    }
}

fn log_report(report: &RunReport) {
    info!(
        rows_read = report.rows_read,
        rows_filtered = report.rows_filtered,
        new_entries = report.new_entries,
        history_rows = report.history_rows,
        persisted = report.persisted,
        notified = report.notified,
        "run finished: {:?}",
        report.outcome
    );
}
