//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use link_sweep::config::Config;
use link_sweep::crawler::{crawl, Coordinator, FetchError};
use link_sweep::output::{write_link_files, CollectingSink, CrawlEvent, NullSink};
use link_sweep::{CrawlPhase, CrawlReport, LinkSweepError, Scope};
use std::collections::HashSet;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration seeded at the mock server root
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::with_seed(format!("{}/", base_url));
    config.crawler.workers = 4;
    config.crawler.request_timeout_ms = 5_000;
    config.crawler.grace_period_ms = 100;
    config
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html_page(body))
        .mount(server)
        .await;
}

fn urls(set: &std::collections::BTreeSet<link_sweep::CanonicalUrl>) -> Vec<String> {
    set.iter().map(|u| u.to_string()).collect()
}

fn failure_messages(events: &[CrawlEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            CrawlEvent::PageFailed { error, .. } => Some(error.clone()),
            _ => None,
        })
        .collect()
}

/// Serves `count` copies of `chunk` with chunked transfer encoding and no
/// Content-Length, on every connection
async fn serve_chunked(chunk: Vec<u8>, count: usize) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let chunk = chunk.clone();
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;

                let head = "HTTP/1.1 200 OK\r\n\
                            content-type: text/html\r\n\
                            transfer-encoding: chunked\r\n\
                            connection: close\r\n\r\n";
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                for _ in 0..count {
                    let frame = format!("{:x}\r\n", chunk.len());
                    if socket.write_all(frame.as_bytes()).await.is_err()
                        || socket.write_all(&chunk).await.is_err()
                        || socket.write_all(b"\r\n").await.is_err()
                    {
                        return;
                    }
                }
                let _ = socket.write_all(b"0\r\n\r\n").await;
            });
        }
    });

    format!("http://{}", addr)
}

async fn run(config: Config) -> CrawlReport {
    crawl(config, NullSink, CancellationToken::new())
        .await
        .expect("crawl should succeed")
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/a">A</a>
           <a href="/a?x=1">A again</a>
           <a href="https://external.example/">Out</a>"#,
    )
    .await;

    // The query variant must collapse into the same page: fetched once
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page(r##"<a href="/">Home</a><a href="#section">Here</a>"##))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = run(create_test_config(&base_url)).await;

    assert_eq!(
        urls(&report.internal),
        vec![format!("{}/", base_url), format!("{}/a", base_url)]
    );
    assert_eq!(urls(&report.external), vec!["https://external.example/"]);
    assert_eq!(report.total_urls(), 3);
    assert_eq!(report.counters.pages_fetched, 2);
    assert_eq!(report.counters.pages_failed, 0);
    assert!(!report.cancelled);
    assert_eq!(report.unfetched, 0);
}

#[tokio::test]
async fn test_cycle_terminates() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/a">A</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page(r#"<a href="/b">B</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page(r#"<a href="/a">A</a><a href="/">Root</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = tokio::time::timeout(Duration::from_secs(10), run(create_test_config(&base_url)))
        .await
        .expect("crawl of a cyclic site should terminate");

    assert_eq!(report.internal.len(), 3);
    assert!(report.external.is_empty());
    assert_eq!(report.counters.pages_fetched, 3);
}

#[tokio::test]
async fn test_error_page_contributes_no_links() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/broken">Broken</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string(r#"<html><body><a href="/hidden">Hidden</a></body></html>"#),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(html_page("never linked"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = run(create_test_config(&base_url)).await;

    // Discovered before it was fetched, so it stays in the internal set
    assert!(urls(&report.internal).contains(&format!("{}/broken", base_url)));
    assert!(!urls(&report.internal).contains(&format!("{}/hidden", base_url)));
    assert_eq!(report.counters.pages_fetched, 1);
    assert_eq!(report.counters.pages_failed, 1);
}

#[tokio::test]
async fn test_seed_http_error_is_not_fatal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let report = run(create_test_config(&base_url)).await;

    assert_eq!(urls(&report.internal), vec![format!("{}/", base_url)]);
    assert!(report.external.is_empty());
    assert_eq!(report.counters.pages_failed, 1);
}

#[tokio::test]
async fn test_unreachable_seed_is_fatal() {
    // Grab a free port, then close it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = create_test_config(&format!("http://127.0.0.1:{}", port));
    let mut coordinator = Coordinator::new(config).unwrap();
    let result = coordinator.run(CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(LinkSweepError::SeedUnreachable { .. })
    ));
    assert_eq!(coordinator.phase(), CrawlPhase::Done);
}

#[tokio::test]
async fn test_oversized_body_is_a_failure() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/big">Big</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(html_page(&format!(
            r#"<a href="/beyond">Beyond</a>{}"#,
            "x".repeat(8 * 1024)
        )))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url);
    config.crawler.max_body_bytes = 2048;
    let report = run(config).await;

    assert_eq!(report.internal.len(), 2);
    assert_eq!(report.counters.pages_fetched, 1);
    assert_eq!(report.counters.pages_failed, 1);
}

#[tokio::test]
async fn test_max_pages_caps_fetches() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: String = (0..10)
        .map(|n| format!(r#"<a href="/p{}">P{}</a>"#, n, n))
        .collect();
    mount_page(&mock_server, "/", &links).await;
    for n in 0..10 {
        mount_page(&mock_server, &format!("/p{}", n), "leaf").await;
    }

    let mut config = create_test_config(&base_url);
    config.crawler.max_pages = Some(3);
    let report = run(config).await;

    assert_eq!(
        report.counters.pages_fetched + report.counters.pages_failed,
        3
    );
    // Discovery is not capped, only fetching
    assert_eq!(report.internal.len(), 11);
    assert_eq!(report.unfetched, 8);
    assert!(!report.cancelled);
}

#[tokio::test]
async fn test_per_host_limit_still_completes() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: String = (0..5)
        .map(|n| format!(r#"<a href="/p{}">P{}</a>"#, n, n))
        .collect();
    mount_page(&mock_server, "/", &links).await;
    for n in 0..5 {
        mount_page(&mock_server, &format!("/p{}", n), "leaf").await;
    }

    let mut config = create_test_config(&base_url);
    config.crawler.per_host_limit = Some(1);
    let report = run(config).await;

    assert_eq!(report.internal.len(), 6);
    assert_eq!(report.counters.pages_fetched, 6);
}

#[tokio::test]
async fn test_cancellation_returns_partial_report() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: String = (0..5)
        .map(|n| format!(r#"<a href="/slow{}">S{}</a>"#, n, n))
        .collect();
    mount_page(&mock_server, "/", &links).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/slow\d$"))
        .respond_with(html_page(r#"<a href="/deeper">Deeper</a>"#).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let report = crawl(create_test_config(&base_url), NullSink, cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert!(report.elapsed < Duration::from_secs(5));
    // Seed plus its five links, none of the slow pages finished
    assert_eq!(report.internal.len(), 6);
    assert_eq!(report.counters.pages_fetched, 1);
}

#[tokio::test]
async fn test_max_duration_cancels_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/slow">Slow</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("late").set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url);
    config.crawler.max_duration_secs = Some(1);
    let report = run(config).await;

    assert!(report.cancelled);
    assert!(report.elapsed < Duration::from_secs(5));
    assert_eq!(report.internal.len(), 2);
}

#[tokio::test]
async fn test_event_stream() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/a">A</a><a href="/a">A twice</a><a href="https://other.org/">Other</a>"#,
    )
    .await;
    mount_page(&mock_server, "/a", r#"<a href="/">Home</a>"#).await;

    let sink = CollectingSink::new();
    let report = crawl(create_test_config(&base_url), sink.clone(), CancellationToken::new())
        .await
        .unwrap();
    let events = sink.events();

    // The seed is announced before anything is fetched
    match &events[0] {
        CrawlEvent::Discovered { scope, url, .. } => {
            assert_eq!(*scope, Scope::Internal);
            assert_eq!(url.to_string(), format!("{}/", base_url));
        }
        other => panic!("expected seed discovery first, got {:?}", other),
    }

    let discovered: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            CrawlEvent::Discovered { url, .. } => Some(url.to_string()),
            _ => None,
        })
        .collect();
    let unique: HashSet<_> = discovered.iter().collect();
    assert_eq!(discovered.len(), unique.len(), "each URL announced once");
    assert_eq!(discovered.len(), report.total_urls());

    let started = events
        .iter()
        .filter(|e| matches!(e, CrawlEvent::PageStarted { .. }))
        .count();
    let finished = events
        .iter()
        .filter(|e| matches!(e, CrawlEvent::PageFinished { .. }))
        .count();
    assert_eq!(started, 2);
    assert_eq!(finished, 2);

    let external_announced = events.iter().any(|e| {
        matches!(e, CrawlEvent::Discovered { scope: Scope::External, url, .. }
            if url.as_str() == "https://other.org/")
    });
    assert!(external_announced);
}

#[tokio::test]
async fn test_report_partition_and_link_files() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/x">X</a><a href="mailto:me@example.com">Mail</a>
           <a href="javascript:void(0)">JS</a><a href="https://other.org/page?q=1#f">Other</a>"#,
    )
    .await;
    mount_page(&mock_server, "/x", r#"<a href="https://other.org/page">Other again</a>"#).await;

    let report = run(create_test_config(&base_url)).await;

    assert!(report.internal.is_disjoint(&report.external));
    assert_eq!(urls(&report.external), vec!["https://other.org/page"]);
    for url in report.internal.iter().chain(report.external.iter()) {
        assert!(url.as_url().query().is_none());
        assert!(url.as_url().fragment().is_none());
    }

    let dir = tempfile::TempDir::new().unwrap();
    let files = write_link_files(&report, dir.path()).unwrap();
    let internal = std::fs::read_to_string(&files.internal).unwrap();
    assert_eq!(internal.lines().count(), 2);
    let external = std::fs::read_to_string(&files.external).unwrap();
    assert_eq!(external, "https://other.org/page\n");
}

#[tokio::test]
async fn test_cancellation_counts_links_found_during_grace_as_unfetched() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/slow">Slow</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            html_page(r#"<a href="/x">X</a><a href="/y">Y</a>"#)
                .set_delay(Duration::from_millis(600)),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url);
    config.crawler.grace_period_ms = 3_000;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let report = crawl(config, NullSink, cancel).await.unwrap();

    // /slow finishes inside the grace period and records /x and /y, but the
    // frontier is already frozen so neither is ever fetched
    assert!(report.cancelled);
    assert_eq!(report.internal.len(), 4);
    assert_eq!(report.counters.pages_fetched, 2);
    assert_eq!(report.unfetched, 2);
}

#[tokio::test]
async fn test_page_timeout_is_a_failure_and_crawl_continues() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/stalled">Stalled</a><a href="/ok">Ok</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/stalled"))
        .respond_with(html_page("too late").set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/ok", r#"<a href="/ok2">Ok 2</a>"#).await;
    mount_page(&mock_server, "/ok2", "leaf").await;

    let mut config = create_test_config(&base_url);
    config.crawler.request_timeout_ms = 500;

    let sink = CollectingSink::new();
    let report = crawl(config, sink.clone(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(failure_messages(&sink.events()), vec!["request timed out"]);
    assert_eq!(report.internal.len(), 4);
    assert_eq!(report.counters.pages_fetched, 3);
    assert_eq!(report.counters.pages_failed, 1);
    assert!(!report.cancelled);
}

#[tokio::test]
async fn test_seed_timeout_is_fatal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("too late").set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url);
    config.crawler.request_timeout_ms = 300;

    let result = crawl(config, NullSink, CancellationToken::new()).await;
    match result {
        Err(LinkSweepError::SeedUnreachable { source, .. }) => {
            assert_eq!(source, FetchError::Timeout);
        }
        other => panic!("expected a fatal seed timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_streamed_body_over_cap_is_a_failure() {
    let mut chunk = br#"<html><body><a href="/never">Never</a>"#.to_vec();
    chunk.resize(1024, b'x');
    let base_url = serve_chunked(chunk, 8).await;

    let mut config = create_test_config(&base_url);
    config.crawler.max_body_bytes = 2048;

    let sink = CollectingSink::new();
    let report = crawl(config, sink.clone(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        failure_messages(&sink.events()),
        vec!["response body exceeds 2048 bytes"]
    );
    // An oversized seed is not fatal, but none of its links are kept
    assert_eq!(urls(&report.internal), vec![format!("{}/", base_url)]);
    assert_eq!(report.counters.pages_failed, 1);
}

#[tokio::test]
async fn test_streamed_body_under_cap_is_fetched() {
    let mut chunk = br#"<html><body><a href="https://other.org/">Other</a>"#.to_vec();
    chunk.resize(512, b' ');
    let base_url = serve_chunked(chunk, 2).await;

    let report = run(create_test_config(&base_url)).await;

    assert_eq!(report.counters.pages_fetched, 1);
    assert_eq!(report.counters.bytes_fetched, 1024);
    assert_eq!(urls(&report.external), vec!["https://other.org/"]);
}
