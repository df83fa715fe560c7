//! Integration tests for `RetrievalService::fetch` and the download →
//! decompress hand-off.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use wiremock::matchers::{header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pricesync_scraper::{convert_directory, RetrievalService, ScraperError, SessionCookie};

fn test_service() -> RetrievalService {
    RetrievalService::new(5, 0, 0).expect("failed to build test RetrievalService")
}

fn gzip(contents: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(contents).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

#[tokio::test]
async fn fetch_streams_body_to_destination() {
    let server = MockServer::start().await;
    let body = gzip(b"<Root><Items/></Root>");
    Mock::given(method("GET"))
        .and(path("/d/Price1-001-202401020300.gz"))
        .and(header("user-agent", "Mozilla/5.0"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let dest = dir.path().join("Price1-001-202401020300.gz");
    let written = test_service()
        .fetch(
            &format!("{}/d/Price1-001-202401020300.gz", server.uri()),
            &dest,
            None,
        )
        .await
        .expect("download succeeds");

    assert_eq!(written, body.len() as u64);
    assert_eq!(std::fs::read(&dest).expect("read dest"), body);
    assert!(!dir.path().join("Price1-001-202401020300.gz.part").exists());
}

#[tokio::test]
async fn fetch_replays_session_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file/d/PriceFull1.gz"))
        .and(header_regex("cookie", "cftpSID=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(b"<Root/>")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file/d/PriceFull1.gz"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let cookies = vec![SessionCookie {
        name: "cftpSID".to_owned(),
        value: "abc123".to_owned(),
    }];
    let dir = tempfile::tempdir().expect("tempdir");
    let dest = dir.path().join("PriceFull1.gz");
    test_service()
        .fetch(
            &format!("{}/file/d/PriceFull1.gz", server.uri()),
            &dest,
            Some(&cookies),
        )
        .await
        .expect("cookie-authorised download succeeds");
    assert!(dest.exists());
}

#[tokio::test]
async fn fetch_maps_404_and_leaves_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.gz"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let dest = dir.path().join("missing.gz");
    let result = test_service()
        .fetch(&format!("{}/missing.gz", server.uri()), &dest, None)
        .await;

    assert!(
        matches!(result, Err(ScraperError::NotFound { .. })),
        "expected NotFound, got: {result:?}"
    );
    assert!(!dest.exists());
    assert!(!dir.path().join("missing.gz.part").exists());
}

#[tokio::test]
async fn fetch_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky.gz"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(b"<Root/>")))
        .mount(&server)
        .await;

    let service = RetrievalService::new(5, 2, 0).expect("service");
    let dir = tempfile::tempdir().expect("tempdir");
    let dest = dir.path().join("flaky.gz");
    service
        .fetch(&format!("{}/flaky.gz", server.uri()), &dest, None)
        .await
        .expect("second attempt succeeds");
    assert!(dest.exists());
}

#[tokio::test]
async fn fetch_replaces_stale_partial_and_existing_destination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Stores1.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let dest = dir.path().join("Stores1.gz");
    std::fs::write(&dest, b"old contents").expect("seed dest");
    std::fs::write(dir.path().join("Stores1.gz.part"), b"crashed half").expect("seed part");

    test_service()
        .fetch(&format!("{}/Stores1.gz", server.uri()), &dest, None)
        .await
        .expect("download succeeds");
    assert_eq!(std::fs::read(&dest).expect("read"), b"fresh");
}

#[tokio::test]
async fn downloaded_archives_convert_to_xml() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/PriceFull1-001-202401020300.gz"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(gzip("<Root><ItemCode>1</ItemCode></Root>".as_bytes())),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    test_service()
        .fetch(
            &format!("{}/PriceFull1-001-202401020300.gz", server.uri()),
            &dir.path().join("PriceFull1-001-202401020300.gz"),
            None,
        )
        .await
        .expect("download succeeds");

    let summary = convert_directory(dir.path());
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);
    let xml = std::fs::read_to_string(dir.path().join("PriceFull1-001-202401020300.xml"))
        .expect("xml written");
    assert!(xml.contains("<ItemCode>1</ItemCode>"));
    assert!(!dir.path().join("PriceFull1-001-202401020300.gz").exists());
}
