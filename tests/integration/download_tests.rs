//! Download batches against mock image pages and assets

use crate::support::{
    article_html, hits, image_page_html, mount_asset, mount_page, mount_status, png_bytes,
    test_config,
};
use image::GenericImageView;
use pixel_harvest::config::prepare_output_directory;
use pixel_harvest::crawler::build_analyzer;
use pixel_harvest::download::DownloadOptions;
use pixel_harvest::storage::{SqliteStorage, Storage};
use pixel_harvest::Dataset;
use std::path::Path;
use wiremock::MockServer;

#[tokio::test]
async fn test_images_are_rescaled_cropped_and_named_after_asset() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/Main-Page",
        article_html(&[], &["/image/Fold-Step-1"]),
    )
    .await;
    mount_page(
        &server,
        "/image/Fold-Step-1",
        image_page_html("/images/a/ab/Fold-a-Shirt-Step-1.jpg"),
    )
    .await;
    mount_asset(&server, "/images/a/ab/Fold-a-Shirt-Step-1.jpg", png_bytes(90, 30)).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, dir.path());

    let destination = prepare_output_directory(&config.download.directory).unwrap();
    let options = DownloadOptions::from_config(&config.download, destination.clone());
    let mut dataset = Dataset::new(config.site.entrypoint.clone(), build_analyzer(&config).unwrap());

    dataset
        .crawl(None, 1, 0)
        .await
        .unwrap()
        .download(&options)
        .await
        .unwrap();

    let saved = image::open(destination.join("Fold-a-Shirt-Step-1.png")).unwrap();
    assert_eq!(saved.dimensions(), (16, 16));
    assert_eq!(dataset.summary().images_saved, 1);
    assert!(dataset.state().pending_downloads().is_empty());
    assert_eq!(dataset.state().discovered_images().len(), 1);
}

#[tokio::test]
async fn test_failing_images_do_not_stop_the_batch() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/Main-Page",
        article_html(
            &[],
            &["/image/good", "/image/corrupt", "/image/no-link", "/image/missing"],
        ),
    )
    .await;
    mount_page(&server, "/image/good", image_page_html("/assets/good.jpg")).await;
    mount_page(&server, "/image/corrupt", image_page_html("/assets/corrupt.jpg")).await;
    mount_page(&server, "/image/no-link", article_html(&[], &[])).await;
    mount_status(&server, "/image/missing", 404).await;
    mount_asset(&server, "/assets/good.jpg", png_bytes(50, 50)).await;
    mount_asset(&server, "/assets/corrupt.jpg", b"definitely not an image".to_vec()).await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = test_config(&server, dir.path());
    config.download.workers = 3;

    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let run_id = storage.create_run("test").unwrap();
    let destination = prepare_output_directory(&config.download.directory).unwrap();
    let options = DownloadOptions::from_config(&config.download, destination.clone());
    let mut dataset = Dataset::new(config.site.entrypoint.clone(), build_analyzer(&config).unwrap())
        .with_storage(Box::new(storage), run_id);

    dataset
        .crawl(None, 1, 0)
        .await
        .unwrap()
        .download(&options)
        .await
        .unwrap();

    let summary = dataset.summary();
    assert_eq!(summary.images_saved, 1);
    assert_eq!(summary.images_failed, 3);
    assert!(dataset.state().pending_downloads().is_empty());
    assert_eq!(hits(&server, "/image/missing").await, 2);

    let files: Vec<_> = std::fs::read_dir(&destination)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["good.png".to_string()]);

    let (storage, _) = dataset.into_storage().unwrap();
    assert_eq!(storage.count_downloads(true).unwrap(), 1);
    assert_eq!(storage.count_downloads(false).unwrap(), 3);
    assert_eq!(storage.count_images(true).unwrap(), 0);
}

#[tokio::test]
async fn test_worker_pool_downloads_every_pending_image() {
    let server = MockServer::start().await;
    let image_pages: Vec<String> = (1..=6).map(|i| format!("/image/Photo-{}", i)).collect();
    let links: Vec<&str> = image_pages.iter().map(String::as_str).collect();
    mount_page(&server, "/Main-Page", article_html(&[], &links)).await;
    for i in 1..=6 {
        mount_page(
            &server,
            &format!("/image/Photo-{}", i),
            image_page_html(&format!("/assets/Photo-{}.jpg", i)),
        )
        .await;
        mount_asset(&server, &format!("/assets/Photo-{}.jpg", i), png_bytes(20 + i, 24)).await;
    }
    let dir = tempfile::tempdir().unwrap();

    let mut config = test_config(&server, dir.path());
    config.download.workers = 4;

    let destination = prepare_output_directory(&config.download.directory).unwrap();
    let options = DownloadOptions::from_config(&config.download, destination.clone());
    assert_eq!(options.parallelism, 4);

    let mut dataset = Dataset::new(config.site.entrypoint.clone(), build_analyzer(&config).unwrap());
    dataset
        .crawl(None, 1, 0)
        .await
        .unwrap()
        .download(&options)
        .await
        .unwrap();

    assert_eq!(dataset.summary().images_saved, 6);
    for i in 1..=6 {
        assert!(destination.join(format!("Photo-{}.png", i)).is_file());
        assert_eq!(hits(&server, &format!("/assets/Photo-{}.jpg", i)).await, 1);
    }
}

#[tokio::test]
async fn test_download_without_pending_images_is_a_no_op() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server, dir.path());

    let destination = prepare_output_directory(&config.download.directory).unwrap();
    let options = DownloadOptions::from_config(&config.download, destination.clone());
    let mut dataset = Dataset::new(config.site.entrypoint.clone(), build_analyzer(&config).unwrap());

    dataset.download(&options).await.unwrap();

    assert_eq!(dataset.summary().images_saved, 0);
    assert_eq!(std::fs::read_dir(&destination).unwrap().count(), 0);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
