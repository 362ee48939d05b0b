//! End-to-end crawl sessions against a mock site

use crate::support::{
    article_html, hits, image_page_html, mount_asset, mount_page, mount_status, png_bytes,
    test_config,
};
use image::GenericImageView;
use pixel_harvest::config::{load_config_with_hash, prepare_output_directory, Config};
use pixel_harvest::crawler::build_analyzer;
use pixel_harvest::output::load_statistics;
use pixel_harvest::storage::{SqliteStorage, Storage};
use pixel_harvest::{CrawlState, Dataset, PageState, SessionPlan};
use std::path::Path;
use wiremock::MockServer;

/// Main-Page -> A, B; A -> B, C, Main-Page; B -> D; C and D are leaves
async fn mount_small_wiki(server: &MockServer) {
    mount_page(
        server,
        "/Main-Page",
        article_html(&["/Article-A", "/Article-B"], &["/image/Main-1"]),
    )
    .await;
    mount_page(
        server,
        "/Article-A",
        article_html(&["/Article-B", "/Article-C", "/Main-Page"], &["/image/A-1"]),
    )
    .await;
    mount_page(server, "/Article-B", article_html(&["/Article-D"], &[])).await;
    mount_page(server, "/Article-C", article_html(&[], &[])).await;
    mount_page(server, "/Article-D", article_html(&[], &[])).await;

    mount_page(server, "/image/Main-1", image_page_html("/assets/Main-1.jpg")).await;
    mount_page(server, "/image/A-1", image_page_html("/assets/A-1.jpg")).await;
    mount_asset(server, "/assets/Main-1.jpg", png_bytes(60, 40)).await;
    mount_asset(server, "/assets/A-1.jpg", png_bytes(40, 60)).await;
}

/// Opens the configured database and builds a dataset resuming its state
fn open_dataset(config: &Config) -> (Dataset, i64) {
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let run_id = storage.create_run("test").unwrap();
    let state = storage
        .load_state()
        .unwrap()
        .unwrap_or_else(|| CrawlState::new(config.site.entrypoint.clone()));

    let dataset = Dataset::with_state(state, build_analyzer(config).unwrap())
        .with_storage(Box::new(storage), run_id)
        .from_scratch(config.crawler.from_scratch);
    (dataset, run_id)
}

fn plan_for(config: &Config) -> SessionPlan {
    let destination = prepare_output_directory(&config.download.directory).unwrap();
    SessionPlan::from_config(config, destination)
}

#[tokio::test]
async fn test_session_crawls_breadth_first_until_page_limit() {
    let server = MockServer::start().await;
    mount_small_wiki(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = test_config(&server, dir.path());
    config.crawler.max_pages = 3;
    config.crawler.batch_size = 1;
    config.download.workers = 2;

    let (mut dataset, _) = open_dataset(&config);
    let summary = dataset.run_session(&plan_for(&config)).await.unwrap();

    assert_eq!(summary.pages_visited, 3);
    assert_eq!(summary.pages_failed, 0);
    assert_eq!(summary.batches, 3);
    assert_eq!(summary.images_saved, 2);

    let base = server.uri();
    let state = dataset.state();
    for page in ["Main-Page", "Article-A", "Article-B"] {
        assert!(state.visited().contains(&format!("{}/{}", base, page)));
    }
    let queued: Vec<_> = state.frontier().iter().cloned().collect();
    assert_eq!(
        queued,
        vec![format!("{}/Article-C", base), format!("{}/Article-D", base)]
    );
    assert!(state.pending_downloads().is_empty());
    assert_eq!(hits(&server, "/Article-C").await, 0);

    let (storage, _) = dataset.into_storage().unwrap();
    assert_eq!(storage.count_visited().unwrap(), 3);
    assert_eq!(storage.count_frontier().unwrap(), 2);
    assert_eq!(storage.count_images(false).unwrap(), 2);
    assert_eq!(storage.count_images(true).unwrap(), 0);
}

#[tokio::test]
async fn test_second_process_resumes_from_database() {
    let server = MockServer::start().await;
    mount_small_wiki(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = test_config(&server, dir.path());
    config.crawler.max_pages = 1;

    {
        let (mut dataset, _) = open_dataset(&config);
        let summary = dataset.run_session(&plan_for(&config)).await.unwrap();
        assert_eq!(summary.pages_visited, 1);
    }

    config.crawler.max_pages = 2;
    let (mut dataset, _) = open_dataset(&config);
    assert_eq!(
        dataset.state().last_visited(),
        format!("{}/Main-Page", server.uri())
    );

    let summary = dataset.run_session(&plan_for(&config)).await.unwrap();
    assert_eq!(summary.pages_visited, 2);
    assert_eq!(dataset.state().visited().len(), 3);

    assert_eq!(hits(&server, "/Main-Page").await, 1);
    assert_eq!(hits(&server, "/Article-A").await, 1);
    assert_eq!(hits(&server, "/Article-B").await, 1);
    assert_eq!(hits(&server, "/image/Main-1").await, 1);
}

#[tokio::test]
async fn test_failed_page_is_recorded_and_crawl_continues() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/Main-Page",
        article_html(&["/Broken", "/Leaf"], &[]),
    )
    .await;
    mount_status(&server, "/Broken", 500).await;
    mount_page(&server, "/Leaf", article_html(&[], &[])).await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = test_config(&server, dir.path());
    config.crawler.max_pages = 0;
    config.crawler.batch_size = 0;

    let (mut dataset, run_id) = open_dataset(&config);
    let summary = dataset.run_session(&plan_for(&config)).await.unwrap();

    assert_eq!(summary.pages_visited, 2);
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.batches, 1);
    assert_eq!(hits(&server, "/Broken").await, 2);

    let broken = format!("{}/Broken", server.uri());
    assert_eq!(dataset.state().page_state(&broken), PageState::Failed);
    assert!(dataset.state().frontier().is_empty());

    let (storage, _) = dataset.into_storage().unwrap();
    assert_eq!(storage.count_pages_in_run(run_id, PageState::Failed).unwrap(), 1);
    assert_eq!(storage.count_pages_in_run(run_id, PageState::Visited).unwrap(), 2);

    let stats = load_statistics(&*storage).unwrap();
    assert_eq!(stats.pages_failed_last_run, 1);
    assert_eq!(stats.pages_visited, 2);
}

#[tokio::test]
async fn test_explicit_start_url_is_canonicalized() {
    let server = MockServer::start().await;
    mount_small_wiki(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = test_config(&server, dir.path());
    config.crawler.max_pages = 1;

    let (mut dataset, _) = open_dataset(&config);
    let mut plan = plan_for(&config);
    plan.start = Some(format!("{}/Article-B?from=cli#top", server.uri()));
    dataset.run_session(&plan).await.unwrap();

    assert_eq!(hits(&server, "/Main-Page").await, 0);
    assert!(dataset
        .state()
        .visited()
        .contains(&format!("{}/Article-B", server.uri())));
}

#[tokio::test]
async fn test_session_from_config_file() {
    let server = MockServer::start().await;
    mount_small_wiki(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let config_path = dir.path().join("harvest.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[site]
origin = "{uri}/"
entrypoint = "{uri}/Main-Page"

[crawler]
fetch-delay-ms = 0
max-jitter-ms = 0
max-pages = 0
batch-size = 2

[download]
directory = "{dir}/images"
rescale = 0
crop-width = 0
crop-height = 0

[output]
database-path = "{dir}/harvest.db"
"#,
            uri = server.uri(),
            dir = dir.path().display()
        ),
    )
    .unwrap();

    let (config, hash) = load_config_with_hash(&config_path).unwrap();
    assert_eq!(hash.len(), 64);

    let (mut dataset, _) = open_dataset(&config);
    let summary = dataset.run_session(&plan_for(&config)).await.unwrap();

    assert_eq!(summary.pages_visited, 5);
    assert_eq!(summary.batches, 3);
    assert_eq!(summary.images_saved, 2);
    assert!(dataset.state().frontier().is_empty());

    let saved = image::open(dir.path().join("images").join("Main-1.png")).unwrap();
    assert_eq!(saved.dimensions(), (60, 40));
}
