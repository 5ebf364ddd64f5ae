use crate::common::{gzip, mount_robots, mount_xml, sitemap_index, test_config, urlset};
use sitemap_harvester::config::{HarvesterConfig, SiteConfig};
use sitemap_harvester::harvester::Harvester;
use sitemap_harvester::{HarvestError, NodeKind};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn harvester() -> Harvester {
    let config = HarvesterConfig {
        workers: 4,
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
        ..HarvesterConfig::default()
    };
    Harvester::new(&config).unwrap()
}

#[tokio::test]
async fn test_robots_index_plain_and_gzip_leaves() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, &[format!("{}/sitemap-index.xml", base)]).await;
    mount_xml(
        &server,
        "/sitemap-index.xml",
        sitemap_index(&[
            format!("{}/sitemap-1.xml", base),
            format!("{}/sitemap-2.xml.gz", base),
        ]),
    )
    .await;
    mount_xml(
        &server,
        "/sitemap-1.xml",
        urlset(&[format!(
            "<url><loc>{}/a</loc><priority>0.8</priority></url>",
            base
        )]),
    )
    .await;

    let leaf_two = urlset(&[format!("<url><loc>{}/b</loc></url>", base)]);
    Mock::given(method("GET"))
        .and(path("/sitemap-2.xml.gz"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(gzip(leaf_two.as_bytes()))
                .insert_header("content-type", "application/x-gzip"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let harvester = harvester();
    let seeds = harvester.discover(&SiteConfig::new(&base)).await;
    assert_eq!(seeds[0], format!("{}/sitemap-index.xml", base));

    let records = harvester.collect(&base, seeds).await.unwrap();

    assert_eq!(records.len(), 2);

    assert_eq!(records[0].location, format!("{}/a", base));
    assert_eq!(records[0].priority, Some(0.8));
    assert_eq!(records[0].source_sitemap, format!("{}/sitemap-1.xml", base));

    assert_eq!(records[1].location, format!("{}/b", base));
    assert_eq!(records[1].priority, None);
    assert_eq!(records[1].source_sitemap, format!("{}/sitemap-2.xml.gz", base));
}

#[tokio::test]
async fn test_transport_gzip_is_decoded() {
    let server = MockServer::start().await;
    let base = server.uri();

    let body = urlset(&[format!("<url><loc>{}/c</loc></url>", base)]);
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(gzip(body.as_bytes()))
                .insert_header("content-type", "application/xml")
                .insert_header("content-encoding", "gzip"),
        )
        .mount(&server)
        .await;

    let records = harvester()
        .collect(&base, vec![format!("{}/sitemap.xml", base)])
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].location, format!("{}/c", base));
}

#[tokio::test]
async fn test_forbidden_leaf_is_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_xml(
        &server,
        "/sitemap-index.xml",
        sitemap_index(&[
            format!("{}/locked.xml", base),
            format!("{}/envelope.xml", base),
            format!("{}/open.xml", base),
        ]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/locked.xml"))
        .respond_with(ResponseTemplate::new(403).set_body_string("<h1>403 Forbidden</h1>"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/envelope.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"error": {"code": 403, "message": "Forbidden"}}"#)
                .insert_header("content-type", "application/json"),
        )
        .mount(&server)
        .await;

    mount_xml(
        &server,
        "/open.xml",
        urlset(&[format!("<url><loc>{}/public</loc></url>", base)]),
    )
    .await;

    let state = harvester()
        .run(&base, vec![format!("{}/sitemap-index.xml", base)])
        .await
        .unwrap();

    assert_eq!(state.records().len(), 1);
    assert_eq!(state.records()[0].location, format!("{}/public", base));

    let counts = state.node_counts();
    assert_eq!(counts.get(&NodeKind::Invalid), Some(&2));
    assert_eq!(counts.get(&NodeKind::Leaf), Some(&1));
}

#[tokio::test]
async fn test_self_referencing_index_terminates() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_index(&[
            format!("{}/sitemap.xml", base),
            format!("{}/loop-a.xml", base),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/loop-a.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_index(&[
            format!("{}/sitemap.xml", base),
            format!("{}/pages.xml", base),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    mount_xml(
        &server,
        "/pages.xml",
        urlset(&[format!("<url><loc>{}/p</loc></url>", base)]),
    )
    .await;

    let state = harvester()
        .run(&base, vec![format!("{}/sitemap.xml", base)])
        .await
        .unwrap();

    assert_eq!(state.visited_count(), 3);
    assert_eq!(state.records().len(), 1);
    assert_eq!(state.depth_exceeded(), 0);
}

#[tokio::test]
async fn test_duplicate_locations_first_leaf_wins() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_xml(
        &server,
        "/sitemap-index.xml",
        sitemap_index(&[format!("{}/first.xml", base), format!("{}/second.xml", base)]),
    )
    .await;
    mount_xml(
        &server,
        "/first.xml",
        urlset(&[format!(
            "<url><loc>{}/shared</loc><priority>0.9</priority></url>",
            base
        )]),
    )
    .await;
    mount_xml(
        &server,
        "/second.xml",
        urlset(&[
            format!("<url><loc>{}/shared</loc><priority>0.1</priority></url>", base),
            format!("<url><loc>{}/only-second</loc></url>", base),
        ]),
    )
    .await;

    let state = harvester()
        .run(&base, vec![format!("{}/sitemap-index.xml", base)])
        .await
        .unwrap();

    let records = state.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].priority, Some(0.9));
    assert_eq!(records[0].source_sitemap, format!("{}/first.xml", base));
    assert_eq!(state.duplicates_dropped(), 1);
}

#[tokio::test]
async fn test_no_resolvable_seed_fails_run() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Welcome</body></html>"))
        .mount(&server)
        .await;

    let harvester = harvester();
    let seeds = harvester.discover(&SiteConfig::new(&base)).await;
    let result = harvester.run(&base, seeds).await;

    assert!(matches!(result, Err(HarvestError::NoSitemaps { .. })));
}

#[tokio::test]
async fn test_failed_site_is_recorded() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &dir.path().join("harvest.db"));

    let summaries = sitemap_harvester::harvest(&config, "hash").await.unwrap();

    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].is_failed());
    assert!(summaries[0].error.is_some());
    assert_eq!(summaries[0].records_written, 0);
}

#[tokio::test]
async fn test_relative_children_follow_redirect_target() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/v2/sitemap.xml"))
        .mount(&server)
        .await;

    mount_xml(
        &server,
        "/v2/sitemap.xml",
        "<sitemapindex><sitemap><loc>pages.xml</loc></sitemap></sitemapindex>".to_string(),
    )
    .await;
    mount_xml(
        &server,
        "/v2/pages.xml",
        urlset(&["<url><loc>about</loc></url>".to_string()]),
    )
    .await;

    let records = harvester()
        .collect(&base, vec![format!("{}/sitemap.xml", base)])
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].location, format!("{}/v2/about", base));
    assert_eq!(records[0].source_sitemap, format!("{}/v2/pages.xml", base));
}

#[tokio::test]
async fn test_extensionless_index_entries_are_counted() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_xml(
        &server,
        "/sitemap.xml",
        sitemap_index(&[format!("{}/sitemap/posts", base), format!("{}/pages.xml", base)]),
    )
    .await;
    mount_xml(
        &server,
        "/pages.xml",
        urlset(&[format!("<url><loc>{}/about</loc></url>", base)]),
    )
    .await;

    let state = harvester()
        .run(&base, vec![format!("{}/sitemap.xml", base)])
        .await
        .unwrap();

    assert_eq!(state.unfollowed_sitemaps(), 1);
    assert_eq!(state.records().len(), 1);
}
