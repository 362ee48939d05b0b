//! Shared fixtures: a mock site and a matching configuration

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pixel_harvest::config::Config;
use std::io::Cursor;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration pointed at `server`, with no politeness delay
pub fn test_config(server: &MockServer, dir: &Path) -> Config {
    let mut config = Config::default();
    config.site.origin = format!("{}/", server.uri());
    config.site.entrypoint = format!("{}/Main-Page", server.uri());
    config.crawler.fetch_delay_ms = 0;
    config.crawler.max_jitter_ms = 0;
    config.crawler.max_attempts = 2;
    config.crawler.request_timeout_secs = 5;
    config.download.directory = dir.join("images").to_string_lossy().into_owned();
    config.download.rescale = 32;
    config.download.crop_width = 16;
    config.download.crop_height = 16;
    config.user_agent.rotate = false;
    config.user_agent.crawler_name = "TestHarvester".to_string();
    config.output.database_path = dir.join("harvest.db").to_string_lossy().into_owned();
    config
}

/// Serves `html` at `route`
pub async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Serves raw bytes at `route`
pub async fn mount_asset(server: &MockServer, route: &str, bytes: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(bytes)
                .insert_header("content-type", "image/png"),
        )
        .mount(server)
        .await;
}

/// Serves an error status at `route`
pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// An article page linking to other articles and image-hosting pages
pub fn article_html(articles: &[&str], images: &[&str]) -> String {
    let mut html = String::from("<html><body><div class=\"steps\">");
    for href in articles {
        html.push_str(&format!(r#"<a class="related-wh" href="{}">article</a>"#, href));
    }
    for href in images {
        html.push_str(&format!(r#"<a class="image" href="{}"><img src="thumb.jpg"></a>"#, href));
    }
    html.push_str("</div></body></html>");
    html
}

/// An image-hosting page wrapping a full-resolution asset
pub fn image_page_html(asset: &str) -> String {
    format!(
        r#"<html><body><div class="fullImageLink"><a href="{}"><img src="{}"></a></div></body></html>"#,
        asset, asset
    )
}

/// PNG-encoded solid image
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([30, 120, 200])));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Number of requests the server received for `route`
pub async fn hits(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}
