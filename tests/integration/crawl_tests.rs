//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use siteharvest::config::Config;
use siteharvest::crawler::{crawl, scrape, PageErrorKind, ScrapeRequest};
use siteharvest::output::{PageStatus, SiteResult};
use siteharvest::storage::{LocalStore, ResultStore, SqliteStore};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short retry delays
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.max_concurrent_requests = 4;
    config.crawler.page_timeout_secs = 5;
    config.crawler.crawl_timeout_secs = 30;
    config.crawler.max_retries = 2;
    config.crawler.retry_delay_ms = 10;
    config
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(format!(
            "<html><head><title>Test</title></head><body>{}</body></html>",
            body
        ))
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn run(server: &MockServer, config: &Config, max_depth: u32) -> SiteResult {
    let request = ScrapeRequest::new(server.uri()).with_max_depth(max_depth);
    crawl(config, &request, None).await.expect("crawl should start")
}

fn page_url(server: &MockServer, route: &str) -> String {
    format!("{}{}", server.uri(), route)
}

#[tokio::test]
async fn test_seed_with_two_links_at_depth_one() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/about">About</a> <a href="/contact">Contact</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/about",
        r#"<p>We have been building widgets for over thirty years.</p>
           <a href="/about/team">Team</a> <a href="/">Home</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/contact",
        "<p>Reach us at contact@example.com or +1 (555) 123-4567 any weekday.</p>",
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/about/team"))
        .respond_with(html_page("team"))
        .expect(0)
        .mount(&server)
        .await;

    let site = run(&server, &create_test_config(), 1).await;

    let structure = &site.sitemap.crawl_structure;
    assert_eq!(structure.len(), 3);
    assert_eq!(structure[&page_url(&server, "/")].depth, 0);
    assert_eq!(structure[&page_url(&server, "/about")].depth, 1);
    assert_eq!(structure[&page_url(&server, "/contact")].depth, 1);
    assert!(!structure.contains_key(&page_url(&server, "/about/team")));

    // Links at the depth limit are still counted
    assert_eq!(structure[&page_url(&server, "/about")].links_found, 2);

    let emails: Vec<_> = site
        .data
        .contact
        .iter()
        .filter(|c| c.value == "contact@example.com")
        .collect();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].page_url, page_url(&server, "/contact"));
    assert!(emails[0].confidence_score > 0.0 && emails[0].confidence_score <= 1.0);

    assert_eq!(site.raw_html.len(), 3);
    assert_eq!(site.data.metadata_list.len(), 3);
    assert!(!site.metadata.truncated);
}

#[tokio::test]
async fn test_persistent_server_error_is_recorded() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/broken">B</a> <a href="/about">A</a>"#).await;
    mount_page(&server, "/about", "<p>About this company and its products.</p>").await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let site = run(&server, &create_test_config(), 1).await;

    assert_eq!(site.errors.len(), 1);
    let error = &site.errors[0];
    assert_eq!(error.url, page_url(&server, "/broken"));
    assert_eq!(error.error_type, PageErrorKind::Http5xx);
    assert_eq!(error.retry_count, 2);
    assert_eq!(error.status_code, Some(500));

    let structure = &site.sitemap.crawl_structure;
    assert_eq!(structure[&page_url(&server, "/broken")].status, PageStatus::Failed);
    assert_eq!(structure[&page_url(&server, "/about")].status, PageStatus::Completed);
    assert_eq!(site.sitemap.coverage_summary.pages_failed, 1);
    assert_eq!(site.sitemap.coverage_summary.total_pages, 3);
}

#[tokio::test]
async fn test_off_domain_links_are_never_crawled() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="https://elsewhere.example.org/page">Partner</a>
           <a href="/local">Local</a>"#,
    )
    .await;
    mount_page(&server, "/local", "<p>Local page content here.</p>").await;

    let site = run(&server, &create_test_config(), 2).await;

    let structure = &site.sitemap.crawl_structure;
    assert_eq!(structure.len(), 2);
    assert!(structure.keys().all(|url| url.starts_with(&server.uri())));
    assert_eq!(structure[&page_url(&server, "/")].links_found, 1);
}

#[tokio::test]
async fn test_depth_bound_and_single_visit() {
    let server = MockServer::start().await;

    // A loop of pages: / -> /a -> /b -> /c -> /d, and every page links home
    mount_page(&server, "/", r#"<a href="/a">a</a>"#).await;
    mount_page(&server, "/a", r#"<a href="/b">b</a> <a href="/">home</a>"#).await;
    mount_page(&server, "/b", r#"<a href="/c">c</a> <a href="/a">a</a> <a href="/">home</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(html_page(r#"<a href="/d">d</a>"#))
        .expect(0)
        .mount(&server)
        .await;

    let site = run(&server, &create_test_config(), 2).await;

    let structure = &site.sitemap.crawl_structure;
    assert_eq!(structure.len(), 3);
    assert!(structure.values().all(|entry| entry.depth <= 2));
    assert_eq!(site.sitemap.coverage_summary.total_pages, site.metadata.total_pages_crawled);
}

#[tokio::test]
async fn test_pages_keep_minimum_discovery_depth() {
    let server = MockServer::start().await;

    // /z is reachable at depth 2 through the slow page and at depth 3 through
    // the fast branch; it must be recorded at depth 2.
    mount_page(&server, "/", r#"<a href="/fast">f</a> <a href="/slow">s</a>"#).await;
    mount_page(&server, "/fast", r#"<a href="/fast/next">n</a>"#).await;
    mount_page(&server, "/fast/next", r#"<a href="/z">z</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page(r#"<a href="/z">z</a>"#).set_delay(Duration::from_millis(400)))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/z", "<p>Destination page reached.</p>").await;

    let site = run(&server, &create_test_config(), 3).await;

    let structure = &site.sitemap.crawl_structure;
    assert_eq!(structure.len(), 5);
    assert_eq!(structure[&page_url(&server, "/z")].depth, 2);
    assert_eq!(structure[&page_url(&server, "/fast/next")].depth, 2);
}

#[tokio::test]
async fn test_all_error_crawl_still_yields_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let site = run(&server, &create_test_config(), 2).await;

    let coverage = &site.sitemap.coverage_summary;
    assert_eq!(coverage.total_pages, 1);
    assert_eq!(coverage.pages_failed, 1);
    assert_eq!(coverage.pages_with_text, 0);
    assert!(site.raw_html.is_empty());
    assert_eq!(site.errors[0].error_type, PageErrorKind::Http4xx);
    assert_eq!(site.errors[0].retry_count, 0);
}

#[tokio::test]
async fn test_crawl_timeout_truncates() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/s1">1</a> <a href="/s2">2</a> <a href="/s3">3</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(html_page("<p>slow</p>").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.crawler.max_concurrent_requests = 1;
    config.crawler.crawl_timeout_secs = 1;

    let site = run(&server, &config, 1).await;

    let coverage = &site.sitemap.coverage_summary;
    assert!(coverage.truncated);
    assert!(site.metadata.truncated);
    assert_eq!(coverage.total_pages, 2);
    assert_eq!(coverage.pending_targets, 2);
}

#[tokio::test]
async fn test_coverage_counts_pages() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<p>The home page has a reasonably long paragraph of text.</p>
           <img src="/logo.png" alt="Logo">
           <a href="/empty">Empty</a>"#,
    )
    .await;
    mount_page(&server, "/empty", "").await;

    let site = run(&server, &create_test_config(), 1).await;

    let coverage = &site.sitemap.coverage_summary;
    assert_eq!(coverage.total_pages, 2);
    assert_eq!(coverage.pages_with_text, 1);
    assert_eq!(coverage.pages_with_images, 1);
    assert!(coverage.pages_with_text <= coverage.total_pages);

    let home = &site.sitemap.crawl_structure[&page_url(&server, "/")];
    let extracted: Vec<_> = home.data_extracted.iter().map(|c| c.as_str()).collect();
    assert_eq!(extracted, vec!["text", "images"]);
    assert!(site.sitemap.crawl_structure[&page_url(&server, "/empty")]
        .data_extracted
        .is_empty());
}

#[tokio::test]
async fn test_redirected_page_is_recorded_under_visited_url() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/old">Old</a> <a href="/slow">Slow</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/guide/intro"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/guide/intro",
        r#"<h1>Getting started guide</h1> <a href="setup">Setup</a>"#,
    )
    .await;
    mount_page(&server, "/guide/setup", "<h1>Setup steps</h1>").await;
    // Links straight to the redirect target once /old has already been fetched
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            html_page(r#"<a href="/guide/intro">Intro</a>"#).set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let site = run(&server, &create_test_config(), 2).await;

    let structure = &site.sitemap.crawl_structure;
    let mut keys: Vec<_> = structure.keys().cloned().collect();
    keys.sort();
    let mut expected = vec![
        page_url(&server, "/"),
        page_url(&server, "/guide/setup"),
        page_url(&server, "/old"),
        page_url(&server, "/slow"),
    ];
    expected.sort();
    assert_eq!(keys, expected);
    assert_eq!(structure[&page_url(&server, "/guide/setup")].depth, 2);

    let intro = site
        .data
        .text
        .iter()
        .find(|t| t.content == "Getting started guide")
        .expect("redirected page text");
    assert_eq!(intro.page_url, page_url(&server, "/old"));

    for item in &site.data.text {
        assert!(structure.contains_key(&item.page_url), "{} not in sitemap", item.page_url);
    }
    for metadata in &site.data.metadata_list {
        assert!(structure.contains_key(&metadata.page_url));
    }
}

#[tokio::test]
async fn test_scrape_stores_every_category_locally() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<p>Write to contact@example.com for partnership enquiries.</p>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut store = LocalStore::new(dir.path());
    let request = ScrapeRequest::new(server.uri())
        .with_company_name("Acme Corp")
        .with_max_depth(1);

    let response = scrape(&create_test_config(), &request, None, &mut store).await;
    assert!(response.is_success(), "{:?}", response.error_message);
    assert_eq!(response.company_name, "Acme Corp");
    assert_eq!(response.storage_files.len(), 8);
    assert!(dir.path().join("acme_corp").join("errors").is_dir());

    let contact = store.load(&response.storage_files["contact"]).await.unwrap();
    assert_eq!(contact["data_type"], "contact");
    assert_eq!(contact["company_name"], "Acme Corp");
    assert_eq!(
        contact["extraction_summary"]["total_items"].as_u64().unwrap() as usize,
        contact["data"].as_array().unwrap().len()
    );
    assert_eq!(contact["metadata"]["total_pages_crawled"], 1);
}

#[tokio::test]
async fn test_scrape_round_trip_sqlite_with_errors() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/gone">Gone</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = SqliteStore::open(&dir.path().join("harvest.db")).unwrap();
    let request = ScrapeRequest::new(server.uri()).with_max_depth(1);

    let response = scrape(&create_test_config(), &request, Some("cfg".to_string()), &mut store).await;
    assert!(response.is_success());
    assert_eq!(response.storage_files.len(), 9);

    let errors = store.load(&response.storage_files["errors"]).await.unwrap();
    assert_eq!(errors["data_type"], "errors");
    assert_eq!(errors["extraction_summary"]["total_items"], 1);
    assert_eq!(errors["metadata"]["config_hash"], "cfg");

    let sitemap = store.load(&response.storage_files["sitemap"]).await.unwrap();
    assert_eq!(sitemap["data"]["coverage_summary"]["total_pages"], 2);
}
