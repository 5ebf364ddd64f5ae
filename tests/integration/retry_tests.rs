use sitemap_harvester::config::HarvesterConfig;
use sitemap_harvester::harvester::{Fetcher, NodeError, NodeWorker, PipelineSettings};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn worker(max_retries: u32, retry_backoff_ms: u64) -> NodeWorker {
    let config = HarvesterConfig {
        request_timeout_secs: 1,
        connect_timeout_secs: 1,
        max_retries,
        retry_backoff_ms,
        ..HarvesterConfig::default()
    };
    NodeWorker::new(
        Fetcher::new(&config).unwrap(),
        Arc::new(PipelineSettings::from(&config)),
    )
}

/// Returns a local URL nothing is listening on
fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/sitemap.xml", port)
}

#[tokio::test]
async fn test_timeout_is_retried_up_to_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow.xml"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .expect(3)
        .mount(&server)
        .await;

    let result = worker(2, 10)
        .load_document(&format!("{}/slow.xml", server.uri()))
        .await;

    assert!(matches!(result, Err(NodeError::Network { .. })));
}

#[tokio::test]
async fn test_http_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let result = worker(3, 10)
        .load_document(&format!("{}/broken.xml", server.uri()))
        .await;

    assert!(matches!(result, Err(NodeError::Http { status: 503, .. })));
}

#[tokio::test]
async fn test_backoff_grows_with_each_attempt() {
    let url = refused_url();

    let started = Instant::now();
    let result = worker(2, 150).load_document(&url).await;
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(NodeError::Network { .. })));
    // 150ms before the first retry, 300ms before the second
    assert!(elapsed >= Duration::from_millis(450), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_no_retries_by_default() {
    let url = refused_url();

    let started = Instant::now();
    let result = worker(0, 1_000).load_document(&url).await;

    assert!(matches!(result, Err(NodeError::Network { .. })));
    assert!(started.elapsed() < Duration::from_millis(1_000));
}
