//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small catalog and run both stages
//! end-to-end over real HTTP, with pacing disabled through the config.

use catalog_harvest::config::{load_config, Config};
use catalog_harvest::harvest::{Coordinator, StopReason};
use std::io::Write;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes a config file pointing both stages at the mock server
fn write_config(server_uri: &str, dir: &TempDir, last_page: u32) -> NamedTempFile {
    let links = dir.path().join("product_links.csv");
    let details = dir.path().join("product_details.csv");
    let failed = dir.path().join("failed_links.csv");

    let content = format!(
        r#"
[http]
request-timeout-ms = 2000

[pacing]
attempt-delay-min-ms = 0
attempt-delay-max-ms = 0
retry-delay-min-ms = 0
retry-delay-max-ms = 0

[discovery]
base-url = "{uri}/women/tops.html"
first-page = 1
last-page = {last_page}
output-path = "{links}"
pool-size = 3
retry-pool-size = 2
max-attempts = 2
retry-max-attempts = 1
max-rounds = 3

[details]
input-path = "{links}"
output-path = "{details}"
failed-path = "{failed}"
pool-size = 2
max-attempts = 5
"#,
        uri = server_uri,
        last_page = last_page,
        links = links.display(),
        details = details.display(),
        failed = failed.display(),
    );

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Builds a listing page with one item per `(href, category)` pair
fn listing_html(items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(href, category)| {
            format!(
                r#"<li><section><article data-category="{}"><a href="{}">item</a></article></section></li>"#,
                category, href
            )
        })
        .collect();

    format!(
        r#"<html><body>
            <div id="products-listing-section"><ul>{}</ul></div>
            <nav><a href="?page=2">Next</a></nav>
        </body></html>"#,
        items
    )
}

fn product_html(name: &str) -> String {
    format!(
        r#"<html><body>
            <h1 class="fa226d af6753 d582fb">{}</h1>
            <p class="d1cd7b ca7db2 e2b79d">Fitted top in soft jersey.</p>
            <div id="section-descriptionAccordion">
                <div class="ecc0f3"><dl><dt>Sleeve Length:</dt><dd>Short sleeve</dd></dl></div>
                <div class="ecc0f3"><dl><dt>Neckline:</dt><dd>Round Neck</dd></dl></div>
                <div class="ecc0f3"><dl><dt>Description:</dt><dd>Black, Solid-color</dd></dl></div>
            </div>
        </body></html>"#,
        name
    )
}

async fn mount_listing(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/women/tops.html"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn load(file: &NamedTempFile) -> Config {
    load_config(file.path()).expect("Failed to load test config")
}

fn read(path: &str) -> String {
    std::fs::read_to_string(Path::new(path)).unwrap()
}

#[tokio::test]
async fn test_discovery_dedups_across_pages() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(
        &server,
        "1",
        listing_html(&[("/p/a.html", "ladies_tops"), ("/p/b.html", "ladies_tops")]),
    )
    .await;
    mount_listing(
        &server,
        "2",
        listing_html(&[("/p/c.html", "ladies_tops"), ("/p/a.html", "ladies_tops")]),
    )
    .await;
    mount_listing(
        &server,
        "3",
        listing_html(&[("/p/e.html", "ladies_tops"), ("/p/d.html", "ladies_tops")]),
    )
    .await;

    let config_file = write_config(&server.uri(), &dir, 3);
    let config = load(&config_file);
    let output = config.discovery.output_path.clone();

    let coordinator = Coordinator::new(config).unwrap();
    let summary = coordinator.discover_links().await.unwrap();

    assert_eq!(summary.units, 3);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.written, 5);
    assert_eq!(summary.stop_reason, StopReason::Drained);

    let uri = server.uri();
    let expected = format!(
        "page_number,link,data_category\n\
         1,{uri}/p/a.html,ladies_tops\n\
         1,{uri}/p/b.html,ladies_tops\n\
         2,{uri}/p/c.html,ladies_tops\n\
         3,{uri}/p/d.html,ladies_tops\n\
         3,{uri}/p/e.html,ladies_tops\n",
        uri = uri
    );
    assert_eq!(read(&output), expected);
}

#[tokio::test]
async fn test_discovery_rerun_appends_without_duplicates() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(
        &server,
        "1",
        listing_html(&[("/p/a.html", "ladies_tops"), ("/p/x.html", "")]),
    )
    .await;

    let config_file = write_config(&server.uri(), &dir, 1);
    let output = load(&config_file).discovery.output_path;

    let first = Coordinator::new(load(&config_file))
        .unwrap()
        .discover_links()
        .await
        .unwrap();
    let second = Coordinator::new(load(&config_file))
        .unwrap()
        .discover_links()
        .await
        .unwrap();

    // The uncategorized item is never written
    assert_eq!(first.written, 1);
    assert_eq!(second.written, 0);

    let content = read(&output);
    assert_eq!(content.matches("page_number").count(), 1);
    assert_eq!(content.lines().count(), 2);
}

#[tokio::test]
async fn test_discovery_failed_page_recovered_in_retry_round() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Page 2 fails both first-round attempts
    Mock::given(method("GET"))
        .and(path("/women/tops.html"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_listing(&server, "1", listing_html(&[("/p/a.html", "ladies_tops")])).await;
    mount_listing(&server, "2", listing_html(&[("/p/b.html", "ladies_tops")])).await;

    let config_file = write_config(&server.uri(), &dir, 2);
    let summary = Coordinator::new(load(&config_file))
        .unwrap()
        .discover_links()
        .await
        .unwrap();

    assert_eq!(summary.rounds, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.written, 2);
    assert_eq!(summary.attempts, 4);
}

#[tokio::test]
async fn test_discovery_resubmits_listing_without_items() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // A challenge page without products first, the real listing afterwards
    Mock::given(method("GET"))
        .and(path("/women/tops.html"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>Please wait</body></html>"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_listing(&server, "1", listing_html(&[("/p/a.html", "ladies_tops")])).await;

    let config_file = write_config(&server.uri(), &dir, 1);
    let summary = Coordinator::new(load(&config_file))
        .unwrap()
        .discover_links()
        .await
        .unwrap();

    assert_eq!(summary.rounds, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.absent, 0);
    assert_eq!(summary.attempts, 2);
    assert_eq!(summary.written, 1);
}

#[tokio::test]
async fn test_details_succeed_after_server_errors() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/p/a.html"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/a.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_html("Ribbed Tank Top")))
        .mount(&server)
        .await;

    let config_file = write_config(&server.uri(), &dir, 1);
    let config = load(&config_file);
    std::fs::write(
        &config.details.input_path,
        format!(
            "page_number,link,data_category\n1,{}/p/a.html,ladies_tops\n",
            server.uri()
        ),
    )
    .unwrap();
    let output = config.details.output_path.clone();

    let summary = Coordinator::new(config)
        .unwrap()
        .harvest_details()
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.attempts, 3);
    assert_eq!(summary.rounds, 1);

    let expected = format!(
        "Product Name,Description,Product URL,Sleeve Length,Neckline,Color,Category\n\
         Ribbed Tank Top,Fitted top in soft jersey.,{}/p/a.html,Short sleeve,Round Neck,\"Black, Solid-color\",ladies_tops\n",
        server.uri()
    );
    assert_eq!(read(&output), expected);
}

#[tokio::test]
async fn test_run_all_feeds_discovered_links_to_details() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(
        &server,
        "1",
        listing_html(&[("/p/a.html", "ladies_tops"), ("/p/gone.html", "ladies_tops")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/p/a.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_html("Linen Shirt")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/gone.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config_file = write_config(&server.uri(), &dir, 1);
    let config = load(&config_file);
    let details_path = config.details.output_path.clone();
    let failed_path = config.details.failed_path.clone().unwrap();

    let summaries = Coordinator::new(config).unwrap().run_all().await.unwrap();

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].written, 2);
    assert_eq!(summaries[1].succeeded, 1);
    assert_eq!(summaries[1].failed, 1);

    let details = read(&details_path);
    assert_eq!(details.lines().count(), 2);
    assert!(details.contains("Linen Shirt"));

    let failed = read(&failed_path);
    assert_eq!(
        failed,
        format!(
            "link,data_category,reason\n{}/p/gone.html,ladies_tops,gave up: HTTP status 404\n",
            server.uri()
        )
    );
}
