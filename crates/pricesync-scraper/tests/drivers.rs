//! Integration tests for the portal drivers against a local `wiremock`
//! server. File names are stamped relative to the local clock so the age
//! filter sees them as fresh (or stale) regardless of when the suite runs.

use chrono::{Duration, Local};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pricesync_core::FileKind;
use pricesync_scraper::{
    RamiLeviDriver, ScraperError, Session, ShufersalDriver, SourceDriver, VictoryDriver,
};

fn test_session() -> Session {
    Session::new(5, "pricesync-test/0.1", 0, 0).expect("failed to build test Session")
}

fn stamp(hours_ago: i64) -> String {
    (Local::now().naive_local() - Duration::hours(hours_ago))
        .format("%Y%m%d%H%M")
        .to_string()
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body.to_owned())
}

// ---------------------------------------------------------------------------
// RamiLevi
// ---------------------------------------------------------------------------

const LOGIN_PAGE: &str = r#"<html><body>
  <form method="post" action="/login/user">
    <input type="hidden" name="csrftoken" value="tok">
    <input type="text" name="username">
    <input type="password" name="password">
    <button type="submit">Sign in</button>
  </form></body></html>"#;

fn file_list(names: &[&str]) -> String {
    let rows: String = names
        .iter()
        .map(|n| format!(r#"<tr><td><a href="/file/d/{n}">{n}</a></td><td>2kb</td></tr>"#))
        .collect();
    format!(r#"<table id="fileList"><tr><th>Name</th></tr>{rows}</table>"#)
}

async fn mount_rami_levi_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(html(LOGIN_PAGE))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login/user"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/file")
                .insert_header("set-cookie", "cftpSID=abc123; Path=/"),
        )
        .mount(server)
        .await;
}

fn rami_levi(server: &MockServer) -> RamiLeviDriver {
    RamiLeviDriver::new(
        &format!("{}/login", server.uri()),
        &format!("{}/file", server.uri()),
        "RamiLevi",
    )
}

#[tokio::test]
async fn rami_levi_logs_in_discovers_and_captures_cookies() {
    let server = MockServer::start().await;
    mount_rami_levi_login(&server).await;

    let fresh = format!("PriceFull7290058140886-001-{}.gz", stamp(1));
    let stale = format!("PriceFull7290058140886-002-{}.gz", stamp(48));
    let other_kind = format!("Price7290058140886-001-{}.gz", stamp(1));
    Mock::given(method("GET"))
        .and(path("/file"))
        .respond_with(html(&file_list(&[&fresh, &stale, &other_kind])))
        .mount(&server)
        .await;

    let session = test_session();
    let mut driver = rami_levi(&server);
    driver.authenticate(&session).await.expect("login succeeds");

    let files = driver
        .discover_files(&session, FileKind::PriceFull, 24)
        .await
        .expect("discovery succeeds");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name, fresh);
    assert_eq!(files[0].download_url, format!("{}/file/d/{fresh}", server.uri()));

    let cookies = driver
        .session_credentials()
        .expect("cookies captured")
        .cookies();
    assert!(cookies.iter().any(|c| c.name == "cftpSID" && c.value == "abc123"));
}

#[tokio::test]
async fn rami_levi_login_fails_when_portal_stays_on_login_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(html(LOGIN_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login/user"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/login"))
        .mount(&server)
        .await;

    let session = test_session();
    let result = rami_levi(&server).authenticate(&session).await;
    assert!(
        matches!(result, Err(ScraperError::Authentication { .. })),
        "expected Authentication, got: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Shufersal
// ---------------------------------------------------------------------------

fn grid_page(names: &[(&str, &str)], next: Option<&str>) -> String {
    let rows: String = names
        .iter()
        .map(|(n, fmt)| {
            format!(
                r#"<tr><td><a href="https://blob.example/price/{n}?sv=1&amp;sig=x">download</a></td>
                       <td>time</td><td>size</td><td>{fmt}</td></tr>"#
            )
        })
        .collect();
    let pager = next
        .map(|href| format!(r#"<a href="{href}">&gt;</a>"#))
        .unwrap_or_default();
    format!(
        r#"<table class="webgrid"><tr><th>Link</th><th>Time</th><th>Size</th><th>Format</th></tr>{rows}</table>{pager}"#
    )
}

#[tokio::test]
async fn shufersal_follows_pagination_and_dedupes() {
    let server = MockServer::start().await;
    let a = format!("Price7290027600007-001-{}.gz", stamp(1));
    let b = format!("Price7290027600007-002-{}.gz", stamp(2));
    let full = format!("PriceFull7290027600007-001-{}.gz", stamp(1));

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&grid_page(
            &[(a.as_str(), "GZ"), (full.as_str(), "GZ")],
            Some("/FileObject/UpdateCategory"),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/FileObject/UpdateCategory"))
        .respond_with(html(&grid_page(
            &[(a.as_str(), "gz"), (b.as_str(), "gz"), ("Price-bad.gz", "GZ")],
            None,
        )))
        .mount(&server)
        .await;

    let session = test_session();
    let mut driver = ShufersalDriver::new(&format!("{}/", server.uri()));
    driver.authenticate(&session).await.expect("grid reachable");

    let files = driver
        .discover_files(&session, FileKind::Price, 24)
        .await
        .expect("discovery succeeds");
    let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec![a.as_str(), b.as_str()]);
}

#[tokio::test]
async fn shufersal_keeps_files_when_a_later_page_fails() {
    let server = MockServer::start().await;
    let a = format!("Price7290027600007-001-{}.gz", stamp(1));

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&grid_page(&[(a.as_str(), "GZ")], Some("/broken"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = test_session();
    let mut driver = ShufersalDriver::new(&format!("{}/", server.uri()));
    let files = driver
        .discover_files(&session, FileKind::Price, 24)
        .await
        .expect("partial discovery succeeds");
    assert_eq!(files.len(), 1);
}

#[tokio::test]
async fn shufersal_first_page_without_grid_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>maintenance</p>"))
        .mount(&server)
        .await;

    let session = test_session();
    let result = ShufersalDriver::new(&format!("{}/", server.uri()))
        .authenticate(&session)
        .await;
    assert!(matches!(result, Err(ScraperError::PageStructure { .. })));
}

#[tokio::test]
async fn shufersal_stops_at_page_limit() {
    let server = MockServer::start().await;
    // every page links back to itself
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&grid_page(&[], Some("/"))))
        .mount(&server)
        .await;

    let session = test_session();
    let result = ShufersalDriver::new(&format!("{}/", server.uri()))
        .discover_files(&session, FileKind::Price, 24)
        .await;
    assert!(matches!(
        result,
        Err(ScraperError::PaginationLimit { max_pages: 200, .. })
    ));
}

// ---------------------------------------------------------------------------
// Victory
// ---------------------------------------------------------------------------

const CATALOG_PAGE: &str = r#"<html><body>
  <form method="post" action="./" id="form1">
    <input type="hidden" name="__VIEWSTATE" value="vs">
    <input type="text" name="ctl00$MainContent$txtDate" id="MainContent_txtDate">
    <input type="submit" name="ctl00$MainContent$btnSearch" id="MainContent_btnSearch" value="search">
  </form>
  <a href="/help">help</a></body></html>"#;

#[tokio::test]
async fn victory_searches_two_days_and_keeps_only_its_chain() {
    let server = MockServer::start().await;
    let ours = format!("Price7290696200003-001-{}-000.xml.gz", stamp(1));
    let other_chain = format!("Price7290661400001-001-{}-000.xml.gz", stamp(1));
    let wrong_kind = format!("PriceFull7290696200003-001-{}-000.xml.gz", stamp(1));
    let results = format!(
        r#"<div id="download_content">
             <a href="Download/{ours}">a</a>
             <a href="Download/{other_chain}">b</a>
             <a href="Download/{wrong_kind}">c</a>
           </div>"#
    );

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(CATALOG_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(html(&results))
        .expect(2)
        .mount(&server)
        .await;

    let session = test_session();
    let mut driver = VictoryDriver::new(&format!("{}/", server.uri()));
    driver.authenticate(&session).await.expect("catalog loads");

    let files = driver
        .discover_files(&session, FileKind::Price, 24)
        .await
        .expect("discovery succeeds");
    assert_eq!(files.len(), 1, "same file on both days is kept once");
    assert_eq!(files[0].file_name, ours);
    assert!(driver.session_credentials().is_none());
}

#[tokio::test]
async fn victory_login_requires_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>empty</p>"))
        .mount(&server)
        .await;

    let session = test_session();
    let result = VictoryDriver::new(&format!("{}/", server.uri()))
        .authenticate(&session)
        .await;
    assert!(matches!(result, Err(ScraperError::Authentication { .. })));
}
