use std::io::{Cursor, Write};
use std::time::Duration;

use anyhow::Result;
use cvmfetcher::{error::FetcherError, ArchiveFetcher, ArchiveParams};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;

fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn params(server: &MockServer, dest: &std::path::Path) -> ArchiveParams {
    ArchiveParams {
        url: format!("{}/dados/oferta_distribuicao.zip", server.uri()),
        dest_dir: dest.to_path_buf(),
        archive_name: "oferta_distribuicao.zip".into(),
        members: vec![
            "oferta_distribuicao.csv".into(),
            "oferta_resolucao_160.csv".into(),
        ],
    }
}

#[tokio::test]
async fn fetch_downloads_and_extracts_requested_members() -> Result<()> {
    let server = MockServer::start().await;
    let body = zip_bytes(&[
        ("oferta_distribuicao.csv", "x;y\n"),
        ("oferta_resolucao_160.csv", "Numero_Requerimento;Numero_Processo\n1;1\n"),
        ("ignored.txt", "noise"),
    ]);
    Mock::given(method("GET"))
        .and(path("/dados/oferta_distribuicao.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir()?;
    let fetcher = ArchiveFetcher::with_default_client(Duration::from_secs(5))?;
    let fetched = fetcher.fetch(&params(&server, dir.path())).await?;

    assert_eq!(fetched.bytes, body.len() as u64);
    assert!(fetched.archive_path.exists());
    assert!(fetched.report.missing.is_empty());
    assert_eq!(fetched.report.extracted.len(), 2);
    assert!(!dir.path().join("ignored.txt").exists());

    let csv = std::fs::read_to_string(dir.path().join("oferta_resolucao_160.csv"))?;
    assert!(csv.starts_with("Numero_Requerimento"));
    Ok(())
}

#[tokio::test]
async fn missing_member_is_reported_not_fatal() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(zip_bytes(&[("oferta_resolucao_160.csv", "a\n")])),
        )
        .mount(&server)
        .await;

    let dir = tempdir()?;
    let fetcher = ArchiveFetcher::with_default_client(Duration::from_secs(5))?;
    let fetched = fetcher.fetch(&params(&server, dir.path())).await?;

    assert_eq!(fetched.report.missing, vec!["oferta_distribuicao.csv".to_string()]);
    assert!(fetched.report.path_of("oferta_resolucao_160.csv").is_some());
    Ok(())
}

#[tokio::test]
async fn non_success_status_fails_before_extraction() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempdir()?;
    let fetcher = ArchiveFetcher::with_default_client(Duration::from_secs(5))?;
    let err = fetcher
        .fetch(&params(&server, dir.path()))
        .await
        .expect_err("503 must abort the fetch");

    assert!(matches!(err, FetcherError::Status { status: 503, .. }));
    assert!(!dir.path().join("oferta_resolucao_160.csv").exists());
    Ok(())
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() -> Result<()> {
    let dir = tempdir()?;
    let fetcher = ArchiveFetcher::with_default_client(Duration::from_secs(2))?;
    let params = ArchiveParams {
        url: "http://127.0.0.1:1/oferta.zip".into(),
        dest_dir: dir.path().to_path_buf(),
        archive_name: "oferta.zip".into(),
        members: vec!["oferta_resolucao_160.csv".into()],
    };

    let err = fetcher.fetch(&params).await.expect_err("connection refused");
    assert!(matches!(err, FetcherError::Http(_)));
    Ok(())
}
