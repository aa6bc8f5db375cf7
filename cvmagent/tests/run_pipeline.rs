//! End-to-end runs of the orchestrator against a mock archive server and a
//! recording notifier.

use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use cvmagent::config::{AgentConfig, SmtpSettings};
use cvmagent::notify::{Notifier, NotifyError};
use cvmagent::orchestrator::{Orchestrator, RunMode};
use cvmagent::{RunError, RunOutcome};
use cvmfetcher::ArchiveFetcher;
use cvmstorage::{codec::encode_latin1, table::read_table};
use tempfile::{tempdir, TempDir};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;

const HEADER: &str = "Numero_Requerimento;Numero_Processo;Valor_Mobiliario;Titulo_incentivado;Nome_Emissor";

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, Vec<String>)>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<(String, String, Vec<String>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string(), recipients.to_vec()));
        if self.fail {
            return Err(NotifyError::NoRecipients);
        }
        Ok(())
    }
}

fn csv(rows: &[&str]) -> Vec<u8> {
    let mut text = String::from(HEADER);
    text.push('\n');
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    encode_latin1(&text).unwrap()
}

fn archive(csv: Vec<u8>) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("oferta_distribuicao.csv", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"legacy;file\n").unwrap();
    writer
        .start_file("oferta_resolucao_160.csv", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(&csv).unwrap();
    writer.finish().unwrap().into_inner()
}

struct Harness {
    _server: MockServer,
    dir: TempDir,
    notifier: Arc<RecordingNotifier>,
    orchestrator: Orchestrator,
}

impl Harness {
    async fn new(response: ResponseTemplate, notifier: RecordingNotifier) -> Result<Self> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(response)
            .mount(&server)
            .await;

        let dir = tempdir()?;
        let mut config = AgentConfig::new(dir.path());
        config.archive_url = format!("{}/oferta_distribuicao.zip", server.uri());
        config.recipients = vec!["ops@example.org".into(), "risk@example.org".into()];
        config.smtp = Some(SmtpSettings {
            host: "localhost".into(),
            port: 587,
            username: "bot".into(),
            password: "secret".into(),
            sender: "bot@example.org".into(),
        });

        let notifier = Arc::new(notifier);
        let fetcher = ArchiveFetcher::with_default_client(Duration::from_secs(5))?;
        let orchestrator = Orchestrator::new(config, fetcher, Some(notifier.clone() as Arc<dyn Notifier>));
        Ok(Self {
            _server: server,
            dir,
            notifier,
            orchestrator,
        })
    }

    async fn serving(rows: &[&str]) -> Result<Self> {
        Self::new(
            ResponseTemplate::new(200).set_body_bytes(archive(csv(rows))),
            RecordingNotifier::default(),
        )
        .await
    }

    fn history_path(&self) -> std::path::PathBuf {
        self.orchestrator.config().storage.history_path.clone()
    }
}

#[tokio::test]
async fn first_run_records_history_and_mails_links() -> Result<()> {
    let harness = Harness::serving(&[
        "1;1;Debêntures;S;Alpha",
        "2;2;Debêntures;S;Beta",
        "3;3;Ações;S;Gamma",
        "4;4;Debêntures;N;Delta",
    ])
    .await?;

    let report = harness.orchestrator.run(RunMode::Commit).await?;

    assert_eq!(report.outcome, RunOutcome::NewEntries);
    assert_eq!(report.rows_read, 4);
    assert_eq!(report.rows_filtered, 2);
    assert_eq!(report.new_entries, 2);
    assert_eq!(report.history_rows, 2);
    assert!(report.persisted && report.notified);

    let calls = harness.notifier.calls();
    assert_eq!(calls.len(), 1);
    let (subject, body, recipients) = &calls[0];
    assert!(subject.contains("(2 novas)"));
    assert!(body.contains("https://web.cvm.gov.br/sre-publico-cvm/#/oferta-publica/1\n"));
    assert!(body.contains("https://web.cvm.gov.br/sre-publico-cvm/#/oferta-publica/2\n"));
    assert_eq!(recipients.len(), 2);

    let history = read_table(&harness.history_path()).into_table();
    assert_eq!(history.len(), 2);
    assert!(harness.dir.path().join("dados_cvm_diarios/oferta_distribuicao.zip").exists());
    Ok(())
}

#[tokio::test]
async fn identical_rerun_does_not_notify() -> Result<()> {
    let harness = Harness::serving(&["1;1;Debêntures;S;Alpha", "2;2;Debêntures;S;Beta"]).await?;

    harness.orchestrator.run(RunMode::Commit).await?;
    let before = std::fs::read(harness.history_path())?;
    let second = harness.orchestrator.run(RunMode::Commit).await?;

    assert_eq!(second.outcome, RunOutcome::NoNewEntries);
    assert_eq!(second.new_entries, 0);
    assert!(second.persisted);
    assert!(!second.notified);
    assert_eq!(harness.notifier.calls().len(), 1, "only the first run mails");
    assert_eq!(std::fs::read(harness.history_path())?, before);
    Ok(())
}

#[tokio::test]
async fn transport_failure_aborts_before_history_is_touched() -> Result<()> {
    let harness = Harness::new(ResponseTemplate::new(500), RecordingNotifier::default()).await?;

    let err = harness
        .orchestrator
        .run(RunMode::Commit)
        .await
        .expect_err("HTTP 500 is fatal");

    assert!(matches!(err, RunError::Transport(_)));
    assert!(!harness.history_path().exists());
    assert!(harness.notifier.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_filter_column_skips_merge_and_mail() -> Result<()> {
    let mut text = String::from("Numero_Requerimento;Numero_Processo;Valor_Mobiliario\n");
    text.push_str("1;1;Debêntures\n");
    let harness = Harness::new(
        ResponseTemplate::new(200).set_body_bytes(archive(encode_latin1(&text)?)),
        RecordingNotifier::default(),
    )
    .await?;

    let report = harness.orchestrator.run(RunMode::Commit).await?;

    match &report.outcome {
        RunOutcome::SchemaFailure { message } => assert!(message.contains("Titulo_incentivado")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!report.persisted);
    assert!(!harness.history_path().exists());
    assert!(harness.notifier.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_delivery_keeps_the_persisted_merge() -> Result<()> {
    let harness = Harness::new(
        ResponseTemplate::new(200).set_body_bytes(archive(csv(&["9;9;Debêntures;S;Omega"]))),
        RecordingNotifier::failing(),
    )
    .await?;

    let report = harness.orchestrator.run(RunMode::Commit).await?;

    assert_eq!(report.outcome, RunOutcome::NewEntries);
    assert!(report.persisted);
    assert!(!report.notified);
    assert_eq!(harness.notifier.calls().len(), 1);
    assert_eq!(read_table(&harness.history_path()).into_table().len(), 1);
    Ok(())
}

#[tokio::test]
async fn dry_run_neither_persists_nor_notifies() -> Result<()> {
    let harness = Harness::serving(&["1;1;Debêntures;S;Alpha"]).await?;

    let report = harness.orchestrator.run(RunMode::DryRun).await?;

    assert_eq!(report.new_entries, 1);
    assert!(!report.persisted);
    assert!(!report.notified);
    assert!(!harness.history_path().exists());
    assert!(harness.notifier.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn archive_without_target_member_is_no_data() -> Result<()> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("oferta_distribuicao.csv", SimpleFileOptions::default())?;
    writer.write_all(b"a;b\n")?;
    let body = writer.finish()?.into_inner();
    let harness = Harness::new(
        ResponseTemplate::new(200).set_body_bytes(body),
        RecordingNotifier::default(),
    )
    .await?;

    let report = harness.orchestrator.run(RunMode::Commit).await?;

    assert!(matches!(report.outcome, RunOutcome::NoData { .. }));
    assert!(!harness.history_path().exists());
    Ok(())
}

#[tokio::test]
async fn process_file_replays_a_local_batch() -> Result<()> {
    let harness = Harness::serving(&[]).await?;
    let input = harness.dir.path().join("replay.csv");
    std::fs::write(&input, csv(&["5;5;Debêntures;S;Local", "6;6;Ações;N;Other"]))?;

    let report = harness.orchestrator.process_file(&input, RunMode::Commit).await?;

    assert_eq!(report.new_entries, 1);
    assert_eq!(harness.notifier.calls().len(), 1);
    Ok(())
}

#[tokio::test]
async fn header_only_batch_is_no_data() -> Result<()> {
    let harness = Harness::serving(&[]).await?;

    let report = harness.orchestrator.run(RunMode::Commit).await?;

    assert!(matches!(report.outcome, RunOutcome::NoData { .. }));
    assert!(!report.persisted);
    assert!(harness.notifier.calls().is_empty());
    Ok(())
}
