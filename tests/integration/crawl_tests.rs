//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small course and run the full scan over
//! HTTP end-to-end.

use lesson_harvest::config::{Config, CrawlerConfig, RetrievalConfig, RetryConfig, SessionConfig, UserAgentConfig};
use lesson_harvest::crawler::{build_http_client, scan, CrawlEngine, HttpPageFetcher, RetryPolicy};
use lesson_harvest::{ProgressReporter, ResourceKind};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING: &str = "/app/dashboard/courses/42/lessons";

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            fetch_delay_ms: 0,
            ..CrawlerConfig::new(base_url)
        },
        retrieval: RetrievalConfig::default(),
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
        },
        retry: RetryConfig {
            attempts: 1,
            delay_ms: 0,
        },
        session: None,
    }
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html_page(body))
        .mount(server)
        .await;
}

#[derive(Default)]
struct RecordingReporter {
    events: Mutex<Vec<(usize, usize)>>,
}

impl ProgressReporter for RecordingReporter {
    fn on_scan_progress(&self, units_visited: usize, initial_links: usize) {
        self.events.lock().unwrap().push((units_visited, initial_links));
    }
}

#[tokio::test]
async fn test_full_scan_over_http() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        LISTING,
        r#"<a href="/app/dashboard/courses/42/lessons/101">Lesson 1</a>
           <a href="/app/dashboard/courses/42/lessons/102">Lesson 2</a>
           <a href="/app/dashboard/courses/42/lessons/101/videos">Videos</a>"#,
    )
    .await;

    // Lesson 101 links back to 102 and forward to 103, which the listing never showed
    mount_page(
        &mock_server,
        "/app/dashboard/courses/42/lessons/101",
        r#"<a href="/api/aluno/pdf/download/101">Book</a>
           <a href="/api/aluno/pdfGrifado/101">Highlighted</a>
           <a href="/app/dashboard/courses/42/lessons/102">Next</a>
           <a href="/app/dashboard/courses/42/lessons/103">Extra</a>"#,
    )
    .await;

    mount_page(
        &mock_server,
        "/app/dashboard/courses/42/lessons/102",
        r#"<a href="/api/video/7/download/resumo">Summary</a>
           <a href="/api/video/7/download/slideshow">Slides</a>
           <a href="/api/video/7/download/720p">Video</a>
           <a href="/app/dashboard/courses/42/lessons/101">Back</a>"#,
    )
    .await;

    mount_page(
        &mock_server,
        "/app/dashboard/courses/42/lessons/103",
        r#"<a href="/api/video/9/download/mapa_mental">Mind map</a>"#,
    )
    .await;

    let config = create_test_config(&base_url);
    let reporter = RecordingReporter::default();
    let resources = scan(&config, "42", Some(&reporter))
        .await
        .expect("Scan should succeed");

    let names: Vec<String> = resources.iter().map(|r| r.file_name()).collect();
    assert_eq!(
        names,
        vec![
            "Unit01_LivroEletronico_Original.pdf",
            "Unit01_LivroEletronico_Grifado.pdf",
            "Unit02_V01_Resumo.pdf",
            "Unit02_V02_Slides.pdf",
            "Unit03_V01_MapaMental.pdf",
        ]
    );

    assert_eq!(
        resources[0].source_url,
        format!("{}/api/aluno/pdf/download/101", base_url)
    );
    assert!(resources.iter().all(|r| r.source_url.starts_with(&base_url)));

    let events = reporter.events.lock().unwrap().clone();
    assert_eq!(events, vec![(1, 2), (2, 2), (3, 2)]);

    // Each page fetched exactly once
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_listing_failure_yields_empty_scan() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let resources = scan(&config, "42", None).await.unwrap();

    assert!(resources.is_empty());
}

#[tokio::test]
async fn test_failed_lesson_is_skipped_but_numbered() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        LISTING,
        r#"<a href="/app/dashboard/courses/42/lessons/1">A</a>
           <a href="/app/dashboard/courses/42/lessons/2">B</a>"#,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/app/dashboard/courses/42/lessons/1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/app/dashboard/courses/42/lessons/2",
        r#"<a href="/api/aluno/pdf/download/2">Book</a>"#,
    )
    .await;

    let config = create_test_config(&mock_server.uri());
    let resources = scan(&config, "42", None).await.unwrap();

    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].unit_index, 2);
    assert_eq!(resources[0].kind, ResourceKind::OriginalBook);
}

#[tokio::test]
async fn test_listing_fetch_is_retried() {
    let mock_server = MockServer::start().await;

    // First request fails, the retry gets the page
    Mock::given(method("GET"))
        .and(path(LISTING))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        LISTING,
        r#"<a href="/app/dashboard/courses/42/lessons/5">Only</a>"#,
    )
    .await;

    mount_page(
        &mock_server,
        "/app/dashboard/courses/42/lessons/5",
        r#"<a href="/api/video/3/download/resumo">Summary</a>"#,
    )
    .await;

    let config = create_test_config(&mock_server.uri());
    let client = build_http_client(&config.user_agent, None).unwrap();
    let fetcher = HttpPageFetcher::new(client, RetryPolicy::new(2, Duration::from_millis(10)));
    let engine = CrawlEngine::new(fetcher, config.crawler.clone());

    let resources = engine.scan_course("42", None).await;

    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].file_name(), "Unit01_V01_Resumo.pdf");
}

#[tokio::test]
async fn test_session_and_user_agent_headers_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(header("cookie", "session=abc123"))
        .and(header("user-agent", "TestBot/1.0.0"))
        .respond_with(html_page(
            r#"<a href="/app/dashboard/courses/42/lessons/8">Only</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/app/dashboard/courses/42/lessons/8",
        r#"<a href="/api/aluno/pdf/download/8">Book</a>"#,
    )
    .await;

    let mut config = create_test_config(&mock_server.uri());
    config.session = Some(SessionConfig {
        cookie: "session=abc123".to_string(),
    });

    let resources = scan(&config, "42", None).await.unwrap();
    assert_eq!(resources.len(), 1);
}

#[tokio::test]
async fn test_unreachable_server_yields_empty_scan() {
    // Nothing listens on port 9 on the loopback interface in the test environment
    let config = create_test_config("http://127.0.0.1:9");
    let fetcher = HttpPageFetcher::from_config(&config).unwrap();
    let engine = CrawlEngine::new(fetcher, config.crawler.clone());

    assert!(engine.scan_course("42", None).await.is_empty());
}
