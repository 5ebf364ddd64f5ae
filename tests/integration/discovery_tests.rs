use sitemap_harvester::config::{HarvesterConfig, SiteConfig};
use sitemap_harvester::discovery::{discover_sitemaps, fetch_robots_sitemaps};
use sitemap_harvester::harvester::Fetcher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> Fetcher {
    Fetcher::new(&HarvesterConfig::default()).unwrap()
}

#[tokio::test]
async fn test_robots_redirect_followed_one_hop() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/moved/robots.txt"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/moved/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("User-agent: *\nSitemap: {}/from-robots.xml\n", base)),
        )
        .mount(&server)
        .await;

    let sitemaps = fetch_robots_sitemaps(&fetcher(), &base).await;
    assert_eq!(sitemaps, vec![format!("{}/from-robots.xml", base)]);
}

#[tokio::test]
async fn test_robots_second_redirect_not_followed() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/hop-1"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/hop-1"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/hop-2"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/hop-2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("Sitemap: {}/too-far.xml\n", base)),
        )
        .expect(0)
        .mount(&server)
        .await;

    let sitemaps = fetch_robots_sitemaps(&fetcher(), &base).await;
    assert!(sitemaps.is_empty());
}

#[tokio::test]
async fn test_missing_robots_falls_back() {
    let server = MockServer::start().await;
    let base = server.uri();

    let seeds = discover_sitemaps(&fetcher(), &SiteConfig::new(&base)).await;

    assert_eq!(seeds.len(), 10);
    assert_eq!(seeds[0], format!("{}/sitemap.xml", base));
    assert!(seeds.contains(&format!("{}/sitemap/index.xml", base)));
}

#[tokio::test]
async fn test_robots_and_fallbacks_are_both_used() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "Sitemap: {0}/custom.xml\nSitemap: {0}/sitemap.xml\n",
            base
        )))
        .mount(&server)
        .await;

    let mut site = SiteConfig::new(&base);
    site.fallback_paths = Some(vec!["/sitemap.xml".to_string(), "/sitemap1.xml".to_string()]);

    let seeds = discover_sitemaps(&fetcher(), &site).await;
    assert_eq!(
        seeds,
        vec![
            format!("{}/custom.xml", base),
            format!("{}/sitemap.xml", base),
            format!("{}/sitemap1.xml", base),
        ]
    );
}
