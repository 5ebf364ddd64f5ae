use flate2::write::GzEncoder;
use flate2::Compression;
use sitemap_harvester::config::{parse_config, Config};
use std::io::Write;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a test configuration harvesting `base_url` into `db_path`
pub fn test_config(base_url: &str, db_path: &Path) -> Config {
    let toml = format!(
        r#"
[harvester]
workers = 4
max-depth = 5
request-timeout-secs = 5
connect-timeout-secs = 2

[output]
database-path = "{}"
batch-size = 2

[[site]]
base-url = "{}"
"#,
        db_path.display(),
        base_url
    );
    parse_config(&toml).expect("test config should be valid")
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn sitemap_index(children: &[String]) -> String {
    let entries: String = children
        .iter()
        .map(|c| format!("  <sitemap><loc>{}</loc></sitemap>\n", c))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</sitemapindex>",
        entries
    )
}

pub fn urlset(entries: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</urlset>",
        entries.concat()
    )
}

/// Serves an XML body at `route`
pub async fn mount_xml(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/xml"),
        )
        .mount(server)
        .await;
}

/// Serves a robots.txt listing the given sitemap URLs
pub async fn mount_robots(server: &MockServer, sitemaps: &[String]) {
    let mut body = String::from("User-agent: *\nDisallow: /admin/\n");
    for sitemap in sitemaps {
        body.push_str(&format!("Sitemap: {}\n", sitemap));
    }
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/plain"),
        )
        .mount(server)
        .await;
}
