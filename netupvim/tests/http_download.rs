//! Conditional download contract tests.
//!
//! Runs the blocking downloader against a local mock server and checks
//! status handling, the conditional header, progress reporting and
//! failures in the middle of a body.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use netupvim::download::{Downloader, HttpDownloader, ProgressFn};
use netupvim::UpdateError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARCHIVE: &str = "/vim/vim74-kaoriya-win64.zip";

fn archive_body() -> Vec<u8> {
    (0..200_000u32).map(|i| (i % 251) as u8).collect()
}

/// Answer one request with raw bytes, then hold the connection open for
/// `linger` before closing it.
fn serve_raw_once(response: &'static [u8], linger: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let _ = stream.write_all(response);
        let _ = stream.flush();
        thread::sleep(linger);
    });
    format!("http://{addr}{ARCHIVE}")
}

const SHORT_BODY: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\nConnection: close\r\n\r\nzip";

#[tokio::test(flavor = "multi_thread")]
async fn test_ok_response_is_saved_with_progress() {
    let server = MockServer::start().await;
    let body = archive_body();

    Mock::given(method("GET"))
        .and(path(ARCHIVE))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}{}", server.uri(), ARCHIVE);
    let temp = tempfile::tempdir().unwrap();
    let out_dir = temp.path().join("tmp");

    let (result, reports) = tokio::task::spawn_blocking(move || {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);
        let progress: &ProgressFn<'_> = &move |done, total| sink.lock().unwrap().push((done, total));

        let downloader = HttpDownloader::new().unwrap();
        let result = downloader.download(&url, &out_dir, None, Some(progress));
        let reports = reports.lock().unwrap().clone();
        (result, reports)
    })
    .await
    .unwrap();

    let saved = result.unwrap();
    assert_eq!(saved, temp.path().join("tmp/vim74-kaoriya-win64.zip"));
    assert_eq!(std::fs::read(&saved).unwrap(), body);

    let total = body.len() as u64;
    assert!(!reports.is_empty());
    assert!(reports.windows(2).all(|w| w[0].0 <= w[1].0));
    assert!(reports.iter().all(|&(_, t)| t == Some(total)));
    assert_eq!(reports.last().unwrap().0, total);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_pivot_is_sent_as_if_modified_since() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ARCHIVE))
        .respond_with(ResponseTemplate::new(304))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}{}", server.uri(), ARCHIVE);
    let temp = tempfile::tempdir().unwrap();
    let out_dir = temp.path().to_path_buf();
    let pivot = Utc.with_ymd_and_hms(2016, 9, 20, 12, 0, 0).unwrap();

    let result = tokio::task::spawn_blocking(move || {
        HttpDownloader::new()
            .unwrap()
            .download(&url, &out_dir, Some(pivot), None)
    })
    .await
    .unwrap();

    assert!(matches!(result, Err(UpdateError::NotModified)));
    assert!(!temp.path().join("vim74-kaoriya-win64.zip").exists());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent = requests[0].headers.get("if-modified-since").unwrap();
    assert_eq!(sent.to_str().unwrap(), "Tue, 20 Sep 2016 12:00:00 GMT");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unconditional_request_has_no_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ARCHIVE))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"zip".to_vec()))
        .mount(&server)
        .await;

    let url = format!("{}{}", server.uri(), ARCHIVE);
    let temp = tempfile::tempdir().unwrap();
    let out_dir = temp.path().to_path_buf();

    tokio::task::spawn_blocking(move || {
        HttpDownloader::new()
            .unwrap()
            .download(&url, &out_dir, None, None)
    })
    .await
    .unwrap()
    .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("if-modified-since"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_status_is_unexpected_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ARCHIVE))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}{}", server.uri(), ARCHIVE);
    let temp = tempfile::tempdir().unwrap();
    let out_dir = temp.path().to_path_buf();

    let result = tokio::task::spawn_blocking(move || {
        HttpDownloader::new()
            .unwrap()
            .download(&url, &out_dir, None, None)
    })
    .await
    .unwrap();

    match result {
        Err(UpdateError::UnexpectedResponse { status, .. }) => {
            assert!(status.starts_with("404"), "status was {status}");
        }
        other => panic!("expected unexpected response, got {other:?}"),
    }
    assert!(!temp.path().join("vim74-kaoriya-win64.zip").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_success_status_other_than_ok_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ARCHIVE))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let url = format!("{}{}", server.uri(), ARCHIVE);
    let temp = tempfile::tempdir().unwrap();
    let out_dir = temp.path().to_path_buf();

    let result = tokio::task::spawn_blocking(move || {
        HttpDownloader::new()
            .unwrap()
            .download(&url, &out_dir, None, None)
    })
    .await
    .unwrap();

    assert!(matches!(result, Err(UpdateError::UnexpectedResponse { .. })));
}

#[test]
fn test_stalled_body_is_timeout() {
    let url = serve_raw_once(SHORT_BODY, Duration::from_secs(3));
    let temp = tempfile::tempdir().unwrap();

    let result = HttpDownloader::with_timeout(Duration::from_secs(1))
        .unwrap()
        .download(&url, temp.path(), None, None);

    match result {
        Err(UpdateError::Timeout { timeout_secs, .. }) => assert_eq!(timeout_secs, 1),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[test]
fn test_truncated_body_is_transfer_failure() {
    let url = serve_raw_once(SHORT_BODY, Duration::ZERO);
    let temp = tempfile::tempdir().unwrap();

    let result = HttpDownloader::with_timeout(Duration::from_secs(10))
        .unwrap()
        .download(&url, temp.path(), None, None);

    assert!(
        matches!(result, Err(UpdateError::TransferFailed { .. })),
        "got {result:?}"
    );
    // The partial file stays behind; it is never handed to the installer.
    assert!(temp.path().join("vim74-kaoriya-win64.zip").exists());
}
