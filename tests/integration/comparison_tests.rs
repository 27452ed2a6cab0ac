//! Integration tests for comparison jobs
//!
//! These tests drive the public service end-to-end: recorded audits through
//! the fixture auditor, live audits against wiremock servers, and both
//! storage backends.

use rivalscope::analysis::AnalysisPolicy;
use rivalscope::audit::{FixtureAuditor, FixtureEntry, HttpAuditor};
use rivalscope::config::AuditorConfig;
use rivalscope::model::{
    Dimension, DimensionScore, FailureReason, QuickWinEmptyReason, SiteAuditResult, SiteRole,
};
use rivalscope::orchestrator::{AuditOrchestrator, ComparisonService, JobResults};
use rivalscope::state::{JobId, JobStatus};
use rivalscope::storage::{ComparisonStore, MemoryStore, SqliteStore};
use rivalscope::ComparisonResult;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POLL: Duration = Duration::from_millis(10);
const USER: &str = "https://example.com/";
const A: &str = "https://a.com/";
const B: &str = "https://b.com/";

/// Builds a recorded result from (dimension, current, max) triples
fn site(url: &str, dims: &[(Dimension, u32, u32)]) -> SiteAuditResult {
    let dimensions: BTreeMap<Dimension, DimensionScore> = dims
        .iter()
        .map(|&(dimension, current, max)| (dimension, DimensionScore::new(current, max)))
        .collect();
    SiteAuditResult::succeeded(url, SiteRole::Competitor, dimensions)
}

/// Six-dimension breakdown in canonical order
fn six(url: &str, points: [u32; 6]) -> SiteAuditResult {
    let maxes = [25, 20, 15, 15, 15, 10];
    let dims: Vec<_> = Dimension::ALL
        .iter()
        .zip(points.iter().zip(maxes.iter()))
        .map(|(&d, (&p, &m))| (d, p, m))
        .collect();
    site(url, &dims)
}

/// The user scores 65, competitor A 78 and competitor B 52
fn example_fixtures() -> FixtureAuditor {
    FixtureAuditor::new()
        .with(USER, FixtureEntry::result(six(USER, [18, 10, 5, 12, 12, 8])))
        .unwrap()
        .with(A, FixtureEntry::result(six(A, [22, 16, 12, 13, 9, 6])))
        .unwrap()
        .with(B, FixtureEntry::result(six(B, [15, 8, 4, 10, 10, 5])))
        .unwrap()
}

fn service_with(
    auditor: FixtureAuditor,
    store: Arc<dyn ComparisonStore>,
    job_timeout: Duration,
) -> ComparisonService {
    let orchestrator =
        AuditOrchestrator::new(Arc::new(auditor), store, AnalysisPolicy::default(), job_timeout);
    ComparisonService::new(orchestrator, 10, 50)
}

fn service(auditor: FixtureAuditor) -> ComparisonService {
    service_with(auditor, Arc::new(MemoryStore::new()), Duration::from_secs(5))
}

fn competitors(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|u| u.to_string()).collect()
}

async fn run_to_end(service: &ComparisonService, urls: &[&str]) -> (JobId, JobStatus) {
    let id = service.start(USER, &competitors(urls), None).unwrap();
    let view = tokio::time::timeout(Duration::from_secs(10), service.wait(&id, POLL))
        .await
        .unwrap()
        .unwrap();
    (id, view.status)
}

fn ready(service: &ComparisonService, id: &JobId) -> ComparisonResult {
    match service.results(id).unwrap() {
        JobResults::Ready(result) => *result,
        other => panic!("expected a result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_example_comparison() {
    let service = service(example_fixtures());
    let (id, status) = run_to_end(&service, &[A, B]).await;
    assert_eq!(status, JobStatus::Complete);

    let result = ready(&service, &id);
    let ranking: Vec<(&str, Option<u32>, Option<u32>)> = result
        .rankings
        .iter()
        .map(|r| (r.url.as_str(), r.rank, r.score))
        .collect();
    assert_eq!(
        ranking,
        vec![
            (A, Some(1), Some(78)),
            (USER, Some(2), Some(65)),
            (B, Some(3), Some(52)),
        ]
    );
    assert_eq!(result.summary.user_rank, Some(2));
    assert_eq!(result.summary.score_gap_to_first, 13);

    // B trails the user in every dimension, so only A produces gaps
    assert!(!result.gaps.is_empty());
    assert!(result.gaps.iter().all(|g| g.competitor_url == A));
    assert!(result.gaps.iter().all(|g| g.gap_magnitude > 0));
    assert!(result
        .gaps
        .windows(2)
        .all(|w| w[0].gap_magnitude >= w[1].gap_magnitude));

    // No single fix closes a 13-point gap
    assert!(!result.strategy.is_empty());
    for action in &result.strategy {
        assert_eq!(action.current_rank, 2);
        assert_eq!(action.potential_rank, 2);
        assert!(action.beats.is_empty());
    }
    assert!(result.quick_wins.actions.is_empty());
    assert!(result.quick_wins.empty_reason.is_some());
}

#[tokio::test]
async fn test_single_fix_overtakes_leader() {
    let auditor = FixtureAuditor::new()
        .with(
            USER,
            FixtureEntry::result(site(
                USER,
                &[(Dimension::Seo, 15, 25), (Dimension::Content, 60, 75)],
            )),
        )
        .unwrap()
        .with(
            A,
            FixtureEntry::result(site(A, &[(Dimension::Seo, 22, 25), (Dimension::Content, 56, 75)])),
        )
        .unwrap();
    let service = service(auditor);
    let (id, _) = run_to_end(&service, &[A]).await;

    let result = ready(&service, &id);
    assert_eq!(result.strategy.len(), 1);
    let action = &result.strategy[0];
    assert_eq!(action.dimension, Dimension::Seo);
    assert_eq!(action.estimated_impact, 7);
    assert_eq!(action.current_rank, 2);
    assert_eq!(action.potential_rank, 1);
    assert!(action.beats.contains(A));
}

#[tokio::test]
async fn test_ties_break_on_seo() {
    let auditor = FixtureAuditor::new()
        .with(
            USER,
            FixtureEntry::result(site(USER, &[(Dimension::Seo, 20, 25), (Dimension::Content, 50, 75)])),
        )
        .unwrap()
        .with(
            A,
            FixtureEntry::result(site(A, &[(Dimension::Seo, 25, 25), (Dimension::Content, 45, 75)])),
        )
        .unwrap();
    let service = service(auditor);
    let (id, _) = run_to_end(&service, &[A]).await;

    let result = ready(&service, &id);
    assert_eq!(result.rankings[0].url, A);
    assert_eq!(result.rankings[0].score, Some(70));
    assert_eq!(result.rankings[1].url, USER);
    assert_eq!(result.rankings[1].score, Some(70));
}

#[tokio::test]
async fn test_user_ahead_of_everyone() {
    let auditor = FixtureAuditor::new()
        .with(USER, FixtureEntry::result(six(USER, [24, 18, 14, 14, 14, 9])))
        .unwrap()
        .with(A, FixtureEntry::result(six(A, [22, 16, 12, 13, 9, 6])))
        .unwrap();
    let service = service(auditor);
    let (id, _) = run_to_end(&service, &[A]).await;

    let result = ready(&service, &id);
    assert_eq!(result.summary.user_rank, Some(1));
    assert!(result.gaps.is_empty());
    assert!(result.strategy.is_empty());
    assert!(result.quick_wins.actions.is_empty());
    assert_eq!(
        result.quick_wins.empty_reason,
        Some(QuickWinEmptyReason::NoActions)
    );
}

#[tokio::test]
async fn test_one_competitor_failure_still_completes() {
    let auditor = example_fixtures()
        .with(B, FixtureEntry::error("connection refused"))
        .unwrap();
    let service = service(auditor);
    let (id, status) = run_to_end(&service, &[A, B]).await;
    assert_eq!(status, JobStatus::Complete);

    let result = ready(&service, &id);
    assert_eq!(result.summary.sites_ranked, 2);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].url, B);
    assert!(matches!(result.failures[0].reason, FailureReason::Error(_)));

    let failed_row = result.rankings.iter().find(|r| r.url == B).unwrap();
    assert_eq!(failed_row.rank, None);
    assert_eq!(failed_row.score, None);
}

#[tokio::test]
async fn test_user_failure_still_ranks_competitors() {
    let auditor = example_fixtures()
        .with(USER, FixtureEntry::error("timeout talking to origin"))
        .unwrap();
    let service = service(auditor);
    let (id, status) = run_to_end(&service, &[A, B]).await;
    assert_eq!(status, JobStatus::Complete);

    let result = ready(&service, &id);
    assert_eq!(result.summary.user_rank, None);
    assert_eq!(result.rankings[0].url, A);
    assert!(result.gaps.is_empty());
    assert!(result.strategy.is_empty());
}

#[tokio::test]
async fn test_all_failures_fail_the_job() {
    let auditor = FixtureAuditor::new()
        .with(USER, FixtureEntry::error("dns"))
        .unwrap()
        .with(A, FixtureEntry::panicking())
        .unwrap();
    let service = service(auditor);
    let (id, status) = run_to_end(&service, &[A]).await;
    assert_eq!(status, JobStatus::Failed);

    match service.results(&id).unwrap() {
        JobResults::Failed { error } => {
            assert!(error.starts_with("all 2 site audits failed"));
            assert!(error.contains("PANICKED"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_panic_is_isolated() {
    let auditor = example_fixtures()
        .with(A, FixtureEntry::panicking())
        .unwrap();
    let service = service(auditor);
    let (id, status) = run_to_end(&service, &[A, B]).await;
    assert_eq!(status, JobStatus::Complete);

    let result = ready(&service, &id);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].reason, FailureReason::Panicked);
    assert_eq!(result.summary.user_rank, Some(1));
}

#[tokio::test]
async fn test_job_deadline_times_out_slow_sites() {
    let auditor = example_fixtures()
        .with(
            B,
            FixtureEntry::result(six(B, [15, 8, 4, 10, 10, 5])).with_delay(Duration::from_secs(30)),
        )
        .unwrap();
    let service = service_with(
        auditor,
        Arc::new(MemoryStore::new()),
        Duration::from_millis(300),
    );

    let started = std::time::Instant::now();
    let (id, status) = run_to_end(&service, &[A, B]).await;
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(status, JobStatus::Complete);

    let result = ready(&service, &id);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].url, B);
    assert_eq!(result.failures[0].reason, FailureReason::Timeout);
}

#[tokio::test]
async fn test_cancel_during_auditing() {
    let slow = Duration::from_secs(30);
    let auditor = example_fixtures()
        .with(A, FixtureEntry::result(six(A, [22, 16, 12, 13, 9, 6])).with_delay(slow))
        .unwrap()
        .with(B, FixtureEntry::result(six(B, [15, 8, 4, 10, 10, 5])).with_delay(slow))
        .unwrap();
    let service = service(auditor);
    let id = service.start(USER, &competitors(&[A, B]), None).unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let view = tokio::time::timeout(Duration::from_secs(5), service.cancel(&id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.status, JobStatus::Cancelled);
    assert!(view.progress < 90);

    // The job never completes afterwards
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(service.status(&id).unwrap().status, JobStatus::Cancelled);
    assert_eq!(service.results(&id).unwrap(), JobResults::Cancelled);
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let auditor = example_fixtures()
        .with(
            A,
            FixtureEntry::result(six(A, [22, 16, 12, 13, 9, 6]))
                .with_delay(Duration::from_millis(80)),
        )
        .unwrap()
        .with(
            B,
            FixtureEntry::result(six(B, [15, 8, 4, 10, 10, 5]))
                .with_delay(Duration::from_millis(160)),
        )
        .unwrap();
    let service = service(auditor);
    let id = service.start(USER, &competitors(&[A, B]), None).unwrap();

    let mut seen = Vec::new();
    loop {
        let view = service.status(&id).unwrap();
        seen.push(view.progress);
        if view.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last(), Some(&100));
}

#[tokio::test]
async fn test_results_are_reproducible() {
    let first = service(example_fixtures());
    let second = service(example_fixtures());
    let (a, _) = run_to_end(&first, &[A, B]).await;
    let (b, _) = run_to_end(&second, &[A, B]).await;

    let left = serde_json::to_string(&ready(&first, &a)).unwrap();
    let right = serde_json::to_string(&ready(&second, &b)).unwrap();
    assert_eq!(left, right);
}

#[tokio::test]
async fn test_sqlite_store_keeps_finished_jobs() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("jobs.db");

    let id = {
        let store = Arc::new(SqliteStore::new(&db_path).unwrap());
        let service = service_with(example_fixtures(), store, Duration::from_secs(5));
        let (id, status) = run_to_end(&service, &[A, B]).await;
        assert_eq!(status, JobStatus::Complete);
        id
    };

    let reopened = SqliteStore::new(&db_path).unwrap();
    let state = reopened.load(&id).unwrap();
    assert_eq!(state.job.status, JobStatus::Complete);
    assert_eq!(state.job.progress, 100);
    assert_eq!(state.result.unwrap().summary.user_rank, Some(2));
}

#[tokio::test]
async fn test_fixture_file_replay() {
    let dir = TempDir::new().unwrap();
    let fixture_path = dir.path().join("fixtures.json");
    let mut entries = BTreeMap::new();
    entries.insert(USER, FixtureEntry::result(six(USER, [18, 10, 5, 12, 12, 8])));
    entries.insert(A, FixtureEntry::error("refused"));
    entries.insert(B, FixtureEntry::result(six(B, [15, 8, 4, 10, 10, 5])));
    std::fs::write(&fixture_path, serde_json::to_string(&entries).unwrap()).unwrap();

    let auditor = FixtureAuditor::from_file(&fixture_path).unwrap();
    assert_eq!(auditor.len(), 3);

    let service = service(auditor);
    let (id, status) = run_to_end(&service, &[A, B]).await;
    assert_eq!(status, JobStatus::Complete);
    assert_eq!(ready(&service, &id).summary.user_rank, Some(1));
}

fn auditor_config() -> AuditorConfig {
    AuditorConfig {
        crawler_name: "RivalBot".to_string(),
        crawler_version: "1.0".to_string(),
        contact_url: "https://example.com/about".to_string(),
        contact_email: "admin@example.com".to_string(),
        request_timeout_secs: 2,
        site_timeout_secs: 10,
    }
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_live_audit_against_mock_sites() {
    let user = MockServer::start().await;
    mount_page(
        &user,
        "/",
        "<html><body><p>Welcome to our shop.</p></body></html>",
    )
    .await;

    let rival = MockServer::start().await;
    mount_page(
        &rival,
        "/",
        r#"<html lang="en"><head>
            <title>Handmade ceramic mugs and bowls</title>
            <meta name="description" content="Small-batch ceramics, fired and glazed by hand in our studio.">
            <meta name="viewport" content="width=device-width, initial-scale=1">
            <meta property="og:title" content="Handmade ceramics">
            <script type="application/ld+json">{"@type": "Organization", "name": "Studio"}</script>
            </head><body>
            <h1>Handmade ceramics</h1>
            <h2>How are the mugs made?</h2>
            <p>Every mug is thrown on the wheel, trimmed and glazed by hand.</p>
            <ul><li>Stoneware</li><li>Porcelain</li></ul>
            <img src="/mug.jpg" alt="Blue mug">
            <a href="/faq">FAQ</a>
            </body></html>"#,
    )
    .await;
    mount_page(
        &rival,
        "/faq",
        r#"<html lang="en"><head><title>Frequently asked questions</title></head><body>
            <h1>FAQ</h1><h2>Do you ship abroad?</h2><p>Yes, worldwide.</p>
            <a href="/">Home</a></body></html>"#,
    )
    .await;

    let auditor = HttpAuditor::new(&auditor_config()).unwrap();
    let orchestrator = AuditOrchestrator::new(
        Arc::new(auditor),
        Arc::new(MemoryStore::new()),
        AnalysisPolicy::default(),
        Duration::from_secs(30),
    );
    let service = ComparisonService::new(orchestrator, 5, 50);

    let id = service
        .start(&user.uri(), &competitors(&[&rival.uri()]), None)
        .unwrap();
    let view = tokio::time::timeout(Duration::from_secs(20), service.wait(&id, POLL))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.status, JobStatus::Complete);

    let result = ready(&service, &id);
    assert!(result.failures.is_empty());
    assert_eq!(result.summary.sites_ranked, 2);
    assert_eq!(result.summary.user_rank, Some(2));
    assert!(result.sites.iter().all(|s| s.total_score <= 100));
    assert!(!result.strategy.is_empty());
    for action in &result.strategy {
        assert!(action.potential_rank <= action.current_rank);
    }
}
