use crate::common::{
    collect_statuses, mount_head, mount_page, mount_slow_head, orchestrator, wait_for_status,
};
use page_lens::jobs::JobError;
use page_lens::storage::MemoryStorage;
use page_lens::JobStatus;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LINK_PAGE: &str = r#"<html><head><title>Links</title></head><body>
    <h1>Links</h1>
    <a href="/ok">ok</a>
    <a href="/missing">missing</a>
</body></html>"#;

#[tokio::test]
async fn test_submit_runs_to_done() {
    let server = MockServer::start().await;
    mount_page(&server, "/", LINK_PAGE).await;
    mount_head(&server, "/ok", 200).await;
    mount_head(&server, "/missing", 404).await;

    let orchestrator = orchestrator(MemoryStorage::new());
    let mut rx = orchestrator.subscribe();

    let url = format!("{}/", server.uri());
    let queued = orchestrator.submit(&url).unwrap();
    assert_eq!(queued.status, JobStatus::Queued);
    assert_eq!(queued.url, url);
    assert!(!queued.id.is_empty());

    let statuses = collect_statuses(&mut rx, &queued.id, 1).await;
    assert_eq!(
        statuses,
        vec![JobStatus::Queued, JobStatus::Running, JobStatus::Done]
    );

    let record = orchestrator.get(&queued.id).unwrap().unwrap();
    assert_eq!(record.id, queued.id);
    assert_eq!(record.status, JobStatus::Done);
    assert_eq!(record.title, "Links");
    assert_eq!(record.headings.get("H1"), 1);
    assert_eq!(record.internal_links, 2);
    assert_eq!(record.accessible_links, 1);
    assert_eq!(record.broken_links.len(), 1);
    assert!(!orchestrator.registry().is_registered(&queued.id));
}

#[tokio::test]
async fn test_fetch_failure_ends_in_error() {
    let orchestrator = orchestrator(MemoryStorage::new());
    let mut rx = orchestrator.subscribe();

    let queued = orchestrator.submit("http://127.0.0.1:9/").unwrap();
    let statuses = collect_statuses(&mut rx, &queued.id, 1).await;

    assert_eq!(
        statuses,
        vec![JobStatus::Queued, JobStatus::Running, JobStatus::Error]
    );
    let record = orchestrator.get(&queued.id).unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Error);
    assert_eq!(record.links_checked(), 0);
}

#[tokio::test]
async fn test_stop_mid_crawl_keeps_partial_result() {
    let server = MockServer::start().await;
    let html = r#"<html><body>
        <a href="/ok">1</a>
        <a href="/slow">2</a>
        <a href="/later">3</a>
    </body></html>"#;
    mount_page(&server, "/", html).await;
    mount_head(&server, "/ok", 200).await;
    mount_slow_head(&server, "/slow", Duration::from_secs(5)).await;
    mount_head(&server, "/later", 200).await;

    let orchestrator = orchestrator(MemoryStorage::new());
    let mut rx = orchestrator.subscribe();

    let queued = orchestrator.submit(&format!("{}/", server.uri())).unwrap();
    wait_for_status(&mut rx, &queued.id, JobStatus::Running).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    orchestrator.stop(&queued.id).unwrap();

    // Marked stopped before the run unwinds
    assert_eq!(
        orchestrator.get(&queued.id).unwrap().unwrap().status,
        JobStatus::Stopped
    );
    assert!(!orchestrator.registry().is_registered(&queued.id));

    let statuses = collect_statuses(&mut rx, &queued.id, 1).await;
    assert_eq!(statuses, vec![JobStatus::Stopped]);

    let record = orchestrator.get(&queued.id).unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Stopped);
    assert_eq!(record.internal_links, 1);
    assert_eq!(record.accessible_links, 1);
    assert!(record.broken_links.is_empty());
}

#[tokio::test]
async fn test_stop_finished_job_reports_not_running() {
    let server = MockServer::start().await;
    mount_page(&server, "/", LINK_PAGE).await;
    mount_head(&server, "/ok", 200).await;

    let orchestrator = orchestrator(MemoryStorage::new());
    let mut rx = orchestrator.subscribe();

    let queued = orchestrator.submit(&format!("{}/", server.uri())).unwrap();
    collect_statuses(&mut rx, &queued.id, 1).await;

    let before = orchestrator.get(&queued.id).unwrap().unwrap();
    assert!(matches!(
        orchestrator.stop(&queued.id),
        Err(JobError::NotRunning(_))
    ));
    assert_eq!(orchestrator.get(&queued.id).unwrap().unwrap(), before);
    assert_eq!(before.status, JobStatus::Done);
}

#[tokio::test]
async fn test_stop_twice_reports_not_running() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/slow">slow</a>"#).await;
    mount_slow_head(&server, "/slow", Duration::from_secs(5)).await;

    let orchestrator = orchestrator(MemoryStorage::new());
    let mut rx = orchestrator.subscribe();

    let queued = orchestrator.submit(&format!("{}/", server.uri())).unwrap();
    wait_for_status(&mut rx, &queued.id, JobStatus::Running).await;

    orchestrator.stop(&queued.id).unwrap();
    assert!(matches!(
        orchestrator.stop(&queued.id),
        Err(JobError::NotRunning(_))
    ));

    collect_statuses(&mut rx, &queued.id, 1).await;
    assert_eq!(
        orchestrator.get(&queued.id).unwrap().unwrap().status,
        JobStatus::Stopped
    );
}

#[tokio::test]
async fn test_resubmit_supersedes_running_job() {
    let server = MockServer::start().await;

    // First fetch hangs; later fetches answer at once
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(LINK_PAGE)
                .set_delay(Duration::from_secs(5)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", LINK_PAGE).await;
    mount_head(&server, "/ok", 200).await;
    mount_head(&server, "/missing", 404).await;

    let orchestrator = orchestrator(MemoryStorage::new());
    let mut rx = orchestrator.subscribe();

    let url = format!("{}/", server.uri());
    let queued = orchestrator.submit(&url).unwrap();
    wait_for_status(&mut rx, &queued.id, JobStatus::Running).await;

    let started = std::time::Instant::now();
    let requeued = orchestrator.resubmit(&queued.id).unwrap();
    assert_eq!(requeued.id, queued.id);
    assert_eq!(requeued.url, url);
    assert_eq!(requeued.status, JobStatus::Queued);

    // Both runs finish: the superseded one without writing anything
    let statuses = collect_statuses(&mut rx, &queued.id, 2).await;
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(
        statuses,
        vec![JobStatus::Queued, JobStatus::Running, JobStatus::Done]
    );

    let record = orchestrator.get(&queued.id).unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Done);
    assert_eq!(record.internal_links, 2);
    assert_eq!(orchestrator.list().unwrap().len(), 1);
}

#[tokio::test]
async fn test_resubmit_finished_job() {
    let server = MockServer::start().await;
    mount_page(&server, "/", LINK_PAGE).await;
    mount_head(&server, "/ok", 200).await;

    let orchestrator = orchestrator(MemoryStorage::new());
    let mut rx = orchestrator.subscribe();

    let queued = orchestrator.submit(&format!("{}/", server.uri())).unwrap();
    collect_statuses(&mut rx, &queued.id, 1).await;

    orchestrator.resubmit(&queued.id).unwrap();
    let statuses = collect_statuses(&mut rx, &queued.id, 1).await;
    assert_eq!(
        statuses,
        vec![JobStatus::Queued, JobStatus::Running, JobStatus::Done]
    );
}

#[tokio::test]
async fn test_remove_running_job() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/slow">slow</a>"#).await;
    mount_slow_head(&server, "/slow", Duration::from_secs(5)).await;

    let orchestrator = orchestrator(MemoryStorage::new());
    let mut rx = orchestrator.subscribe();

    let queued = orchestrator.submit(&format!("{}/", server.uri())).unwrap();
    wait_for_status(&mut rx, &queued.id, JobStatus::Running).await;

    assert!(orchestrator.remove(&queued.id).unwrap());
    assert!(orchestrator.get(&queued.id).unwrap().is_none());

    // The cancelled run must not bring the record back
    let statuses = collect_statuses(&mut rx, &queued.id, 1).await;
    assert!(statuses.is_empty());
    assert!(orchestrator.get(&queued.id).unwrap().is_none());
    assert!(orchestrator.list().unwrap().is_empty());

    assert!(matches!(
        orchestrator.stop(&queued.id),
        Err(JobError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_concurrent_jobs_are_independent() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", r#"<a href="/ok">ok</a>"#).await;
    mount_page(&server, "/b", r#"<a href="/ok">ok</a><a href="/missing">x</a>"#).await;
    mount_head(&server, "/ok", 200).await;
    mount_head(&server, "/missing", 404).await;

    let orchestrator = orchestrator(MemoryStorage::new());
    let mut rx_a = orchestrator.subscribe();
    let mut rx_b = orchestrator.subscribe();

    let a = orchestrator.submit(&format!("{}/a", server.uri())).unwrap();
    let b = orchestrator.submit(&format!("{}/b", server.uri())).unwrap();

    collect_statuses(&mut rx_a, &a.id, 1).await;
    collect_statuses(&mut rx_b, &b.id, 1).await;

    let ids: Vec<String> = orchestrator
        .list()
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![a.id.clone(), b.id.clone()]);

    assert_eq!(orchestrator.get(&a.id).unwrap().unwrap().broken_links.len(), 0);
    assert_eq!(orchestrator.get(&b.id).unwrap().unwrap().broken_links.len(), 1);
}

#[tokio::test]
async fn test_stop_then_resubmit_keeps_new_result() {
    let server = MockServer::start().await;

    // The first run hangs on its probe; the second finds it fast
    Mock::given(method("HEAD"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_head(&server, "/slow", 200).await;
    mount_page(&server, "/", r#"<a href="/slow">slow</a>"#).await;

    let orchestrator = orchestrator(MemoryStorage::new());
    let mut rx = orchestrator.subscribe();

    let queued = orchestrator.submit(&format!("{}/", server.uri())).unwrap();
    wait_for_status(&mut rx, &queued.id, JobStatus::Running).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    orchestrator.stop(&queued.id).unwrap();
    orchestrator.resubmit(&queued.id).unwrap();

    let statuses = collect_statuses(&mut rx, &queued.id, 2).await;
    assert_eq!(statuses.last(), Some(&JobStatus::Done));

    let record = orchestrator.get(&queued.id).unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Done);
    assert_eq!(record.accessible_links, 1);
}
