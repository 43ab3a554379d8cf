use crate::common::{mount_head, mount_page, mount_slow_head, test_http_config};
use page_lens::crawler::{AnalyzeError, PageAnalyzer, PROBE_FAILURE_STATUS};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

fn analyzer() -> PageAnalyzer {
    PageAnalyzer::new(&test_http_config()).expect("Failed to build analyzer")
}

#[tokio::test]
async fn test_full_page_analysis() {
    let server = MockServer::start().await;
    let base = format!("{}/", server.uri());

    let html = r##"<!DOCTYPE html>
        <html>
          <head><title>  Welcome Home </title></head>
          <body>
            <h1>One</h1><h1>Two</h1><h2>Sub</h2>
            <a href="#top">Top</a>
            <a href="">Empty</a>
            <a href="/about">About</a>
            <a href="/missing">Missing</a>
            <a href="http://localhost:9/down">Down</a>
            <form action="/login"><input type="text" name="user"><input type="password" name="pw"></form>
          </body>
        </html>"##;

    mount_page(&server, "/", html).await;
    mount_head(&server, "/about", 200).await;
    mount_head(&server, "/missing", 404).await;

    let record = analyzer()
        .analyze(&base, &CancellationToken::new())
        .await
        .expect("analysis failed");

    assert_eq!(record.title, "Welcome Home");
    assert_eq!(record.html_version, "XHTML or HTML 4.01");
    assert!(record.has_login_form);

    assert_eq!(record.headings.len(), 6);
    assert_eq!(record.headings.get("H1"), 2);
    assert_eq!(record.headings.get("H2"), 1);
    assert_eq!(record.headings.get("H3"), 0);

    // Fragment-only and empty anchors are not counted at all
    assert_eq!(record.internal_links, 2);
    assert_eq!(record.external_links, 1);
    assert_eq!(record.accessible_links, 1);
    assert_eq!(record.broken_links.len(), 2);

    assert_eq!(record.broken_links[0].url, format!("{}/missing", server.uri()));
    assert_eq!(record.broken_links[0].status, 404);
    assert_eq!(record.broken_links[1].url, "http://localhost:9/down");
    assert_eq!(record.broken_links[1].status, PROBE_FAILURE_STATUS);
}

#[tokio::test]
async fn test_accessible_link_is_not_broken() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<html><body><a href="/ok">ok</a></body></html>"#).await;
    mount_head(&server, "/ok", 200).await;

    let record = analyzer()
        .analyze(&format!("{}/", server.uri()), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(record.accessible_links, 1);
    assert!(record.broken_links.is_empty());
    assert!(!record.has_login_form);
    assert_eq!(record.title, "");
}

#[tokio::test]
async fn test_password_outside_form_is_not_login() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><input type="password"><form><input type="text"></form></body></html>"#,
    )
    .await;

    let record = analyzer()
        .analyze(&format!("{}/", server.uri()), &CancellationToken::new())
        .await
        .unwrap();

    assert!(!record.has_login_form);
    assert_eq!(record.links_checked(), 0);
}

#[tokio::test]
async fn test_cancel_mid_crawl_keeps_processed_links() {
    let server = MockServer::start().await;
    let html = r#"<html><body>
        <a href="/fast-1">1</a>
        <a href="/fast-2">2</a>
        <a href="/slow">3</a>
        <a href="/never">4</a>
    </body></html>"#;

    mount_page(&server, "/", html).await;
    mount_head(&server, "/fast-1", 200).await;
    mount_head(&server, "/fast-2", 404).await;
    mount_slow_head(&server, "/slow", Duration::from_secs(5)).await;
    mount_head(&server, "/never", 200).await;

    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();
    });

    let started = std::time::Instant::now();
    let record = analyzer()
        .analyze(&format!("{}/", server.uri()), &token)
        .await
        .expect("cancellation mid-crawl is a partial result");

    // The slow probe was aborted rather than waited out
    assert!(started.elapsed() < Duration::from_secs(4));

    assert_eq!(record.internal_links, 2);
    assert_eq!(record.external_links, 0);
    assert_eq!(record.accessible_links, 1);
    assert_eq!(record.broken_links.len(), 1);
    assert_eq!(record.broken_links[0].status, 404);
}

#[tokio::test]
async fn test_non_html_body_still_analyzes() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "just some text").await;

    let record = analyzer()
        .analyze(&format!("{}/", server.uri()), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(record.links_checked(), 0);
    assert_eq!(record.headings.get("h1"), 0);
}

#[tokio::test]
async fn test_unparseable_url_is_transport_error() {
    let result = analyzer()
        .analyze("definitely not a url", &CancellationToken::new())
        .await;

    match result {
        Err(AnalyzeError::Transport { url, .. }) => assert_eq!(url, "definitely not a url"),
        other => panic!("expected transport error, got {:?}", other),
    }
}
