use crate::common::{mount_robots, mount_xml, sitemap_index, test_config, urlset};
use sitemap_harvester::harvest;
use sitemap_harvester::storage::{RecordStore, RunStatus, SqliteStorage};
use tempfile::TempDir;
use wiremock::MockServer;

async fn mount_site(server: &MockServer) {
    let base = server.uri();
    mount_robots(server, &[format!("{}/sitemap-index.xml", base)]).await;
    mount_xml(
        server,
        "/sitemap-index.xml",
        sitemap_index(&[format!("{}/pages.xml", base), format!("{}/posts.xml", base)]),
    )
    .await;
    mount_xml(
        server,
        "/pages.xml",
        urlset(&[
            format!("<url><loc>{}/about</loc><priority>0.5</priority></url>", base),
            format!("<url><loc>{}/contact</loc><changefreq>monthly</changefreq></url>", base),
        ]),
    )
    .await;
    mount_xml(
        server,
        "/posts.xml",
        urlset(&[
            format!("<url><loc>{}/posts/1</loc></url>", base),
            format!("<url><loc>{}/about</loc></url>", base),
            format!("<url><loc>{}/posts/2</loc><priority>bogus</priority></url>", base),
        ]),
    )
    .await;
}

#[tokio::test]
async fn test_harvest_persists_records() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let base = server.uri();

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("harvest.db");
    let config = test_config(&base, &db_path);

    let summaries = harvest(&config, "hash-1").await.unwrap();
    let summary = &summaries[0];

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.records_written, 3);
    assert_eq!(summary.records_extracted, 3);
    assert_eq!(summary.duplicates_dropped, 1);
    assert_eq!(summary.invalid_entries, 1);
    // batch-size 2 in the test config
    assert_eq!(summary.batches_attempted, 2);
    assert_eq!(summary.batches_failed, 0);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_records().unwrap(), 3);

    let about = storage
        .get_record(&format!("{}/about", base))
        .unwrap()
        .unwrap();
    assert_eq!(about.priority, Some(0.5));
    assert_eq!(about.source_sitemap, format!("{}/pages.xml", base));

    let contact = storage
        .get_record(&format!("{}/contact", base))
        .unwrap()
        .unwrap();
    assert_eq!(contact.priority, None);
    assert_eq!(contact.change_frequency.as_deref(), Some("monthly"));

    let run = storage.get_run(summary.run_id.unwrap()).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.records_written, 3);
    assert_eq!(run.config_hash, "hash-1");
}

#[tokio::test]
async fn test_rerun_writes_no_duplicates() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("harvest.db");
    let config = test_config(&server.uri(), &db_path);

    let first = harvest(&config, "hash").await.unwrap();
    let second = harvest(&config, "hash").await.unwrap();

    assert_eq!(first[0].records_written, 3);
    assert_eq!(second[0].records_written, 0);
    assert_eq!(second[0].batches_failed, 0);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_records().unwrap(), 3);

    let runs = storage.list_runs().unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.status == RunStatus::Completed));
}
