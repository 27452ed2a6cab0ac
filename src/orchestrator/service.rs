//! Job-facing operations: start, status, results, cancel
//!
//! The service validates requests, records the queued job and hands it to a
//! background flow driven by [`AuditOrchestrator`]. Callers observe the job
//! only through the store, so polling never blocks on a running flow.

use crate::analysis::AnalysisPolicy;
use crate::audit::Auditor;
use crate::config::Config;
use crate::model::ComparisonResult;
use crate::orchestrator::cancel::CancelToken;
use crate::orchestrator::coordinator::AuditOrchestrator;
use crate::state::{ComparisonJob, JobId, JobStatus, JobStatusView};
use crate::storage::{ComparisonStore, JobState, StorageError};
use crate::url::{normalize_site_url, site_key};
use crate::{Result, RivalError, ValidationError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Most competitors one comparison may include
pub const MAX_COMPETITORS: usize = 3;

/// A request that passed validation, with every URL normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRequest {
    pub user_url: String,
    pub competitor_urls: Vec<String>,
    pub max_pages: u32,
}

/// What `results` returns for a job
#[derive(Debug, Clone, PartialEq)]
pub enum JobResults {
    Ready(Box<ComparisonResult>),
    NotReady { status: JobStatus, progress: u8 },
    Failed { error: String },
    Cancelled,
}

struct RunningJob {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

type RunningJobs = Arc<Mutex<HashMap<JobId, RunningJob>>>;

fn lock(running: &RunningJobs) -> MutexGuard<'_, HashMap<JobId, RunningJob>> {
    running.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Entry point for comparison jobs
pub struct ComparisonService {
    orchestrator: Arc<AuditOrchestrator>,
    running: RunningJobs,
    default_max_pages: u32,
    max_pages_limit: u32,
}

impl ComparisonService {
    pub fn new(orchestrator: AuditOrchestrator, default_max_pages: u32, max_pages_limit: u32) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            running: Arc::new(Mutex::new(HashMap::new())),
            default_max_pages,
            max_pages_limit,
        }
    }

    /// Wires a service from a loaded configuration
    pub fn from_config(
        config: &Config,
        auditor: Arc<dyn Auditor>,
        store: Arc<dyn ComparisonStore>,
    ) -> Self {
        let orchestrator = AuditOrchestrator::new(
            auditor,
            store,
            AnalysisPolicy::from(&config.analysis),
            Duration::from_secs(config.orchestrator.job_timeout_secs),
        );
        Self::new(
            orchestrator,
            config.orchestrator.default_max_pages,
            config.orchestrator.max_pages_limit,
        )
    }

    pub fn store(&self) -> &Arc<dyn ComparisonStore> {
        self.orchestrator.store()
    }

    /// Checks a request without starting anything
    ///
    /// Requires 1 to 3 competitors, a page budget within the configured
    /// limit, URLs that normalize, and no two URLs naming the same site.
    pub fn validate_request(
        &self,
        user_url: &str,
        competitor_urls: &[String],
        max_pages: Option<u32>,
    ) -> std::result::Result<ComparisonRequest, ValidationError> {
        if competitor_urls.is_empty() || competitor_urls.len() > MAX_COMPETITORS {
            return Err(ValidationError::CompetitorCount(competitor_urls.len()));
        }

        let max_pages = max_pages.unwrap_or(self.default_max_pages);
        if max_pages == 0 || max_pages > self.max_pages_limit {
            return Err(ValidationError::MaxPages {
                got: max_pages,
                limit: self.max_pages_limit,
            });
        }

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(1 + competitor_urls.len());
        for raw in std::iter::once(user_url).chain(competitor_urls.iter().map(String::as_str)) {
            let url = normalize_site_url(raw).map_err(|source| ValidationError::InvalidUrl {
                url: raw.to_string(),
                source,
            })?;
            if !seen.insert(site_key(&url)) {
                return Err(ValidationError::DuplicateUrl {
                    url: raw.to_string(),
                });
            }
            normalized.push(url.to_string());
        }

        let user_url = normalized.remove(0);
        Ok(ComparisonRequest {
            user_url,
            competitor_urls: normalized,
            max_pages,
        })
    }

    /// Validates a request, records it as queued and starts auditing in the
    /// background
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        &self,
        user_url: &str,
        competitor_urls: &[String],
        max_pages: Option<u32>,
    ) -> Result<JobId> {
        let request = self.validate_request(user_url, competitor_urls, max_pages)?;
        let job = ComparisonJob::new(
            request.user_url,
            request.competitor_urls,
            request.max_pages,
        );
        let job_id = job.id;

        self.store().save(&JobState::new(job.clone()))?;
        tracing::info!(
            "Job {} queued: {} against {} competitors",
            job_id,
            job.user_url,
            job.competitor_urls.len()
        );

        let token = CancelToken::new();
        let orchestrator = Arc::clone(&self.orchestrator);
        let running = Arc::clone(&self.running);
        let flow_token = token.clone();

        // Hold the lock across the spawn so the flow cannot deregister first
        let mut jobs = lock(&self.running);
        let handle = tokio::spawn(async move {
            let state = orchestrator.run(job, flow_token).await;
            lock(&running).remove(&state.job.id);
        });
        jobs.insert(
            job_id,
            RunningJob {
                cancel: token,
                handle,
            },
        );

        Ok(job_id)
    }

    pub fn status(&self, job_id: &JobId) -> Result<JobStatusView> {
        Ok(self.load(job_id)?.job.status_view())
    }

    /// Every stored job, oldest first
    pub fn list(&self) -> Result<Vec<JobStatusView>> {
        Ok(self
            .store()
            .list()?
            .iter()
            .map(|state| state.job.status_view())
            .collect())
    }

    /// The comparison result once complete; otherwise why there is none
    pub fn results(&self, job_id: &JobId) -> Result<JobResults> {
        let state = self.load(job_id)?;
        match state.job.status {
            JobStatus::Complete => match state.result {
                Some(result) => Ok(JobResults::Ready(Box::new(result))),
                None => Err(StorageError::Corrupt {
                    id: job_id.to_string(),
                    message: "complete job has no result".to_string(),
                }
                .into()),
            },
            JobStatus::Failed => Ok(JobResults::Failed {
                error: state.job.error.unwrap_or_default(),
            }),
            JobStatus::Cancelled => Ok(JobResults::Cancelled),
            status => Ok(JobResults::NotReady {
                status,
                progress: state.job.progress,
            }),
        }
    }

    /// Cancels a queued or auditing job and returns its final status
    ///
    /// Waits for the job's flow to record the cancellation. A job that was
    /// already analyzing when the signal arrived runs to completion and is
    /// reported as not cancellable.
    pub async fn cancel(&self, job_id: &JobId) -> Result<JobStatusView> {
        let state = self.load(job_id)?;
        if !state.job.status.is_cancellable() {
            return Err(RivalError::NotCancellable {
                job_id: *job_id,
                status: state.job.status,
            });
        }

        let running = lock(&self.running).remove(job_id);
        match running {
            Some(running) => {
                tracing::info!("Cancelling job {}", job_id);
                running.cancel.cancel();
                if let Err(e) = running.handle.await {
                    tracing::warn!("Flow for job {} ended abnormally: {}", job_id, e);
                }
            }
            None => {
                // No flow in this process owns the job; record the cancellation directly
                let mut state = state;
                state.job.cancel()?;
                self.store().save(&state)?;
                tracing::info!("Cancelled orphaned job {}", job_id);
            }
        }

        let view = self.status(job_id)?;
        if view.status != JobStatus::Cancelled {
            return Err(RivalError::NotCancellable {
                job_id: *job_id,
                status: view.status,
            });
        }
        Ok(view)
    }

    /// Polls until the job reaches a terminal status
    pub async fn wait(&self, job_id: &JobId, poll: Duration) -> Result<JobStatusView> {
        let mut last_progress = None;
        loop {
            let view = self.status(job_id)?;
            if last_progress != Some(view.progress) {
                tracing::debug!("Job {}: {} at {}%", job_id, view.status, view.progress);
                last_progress = Some(view.progress);
            }
            if view.status.is_terminal() {
                return Ok(view);
            }
            tokio::time::sleep(poll).await;
        }
    }

    fn load(&self, job_id: &JobId) -> Result<JobState> {
        self.store().load(job_id).map_err(|e| match e {
            StorageError::JobNotFound(id) => RivalError::JobNotFound(id),
            other => other.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::site;
    use crate::audit::{FixtureAuditor, FixtureEntry};
    use crate::model::SiteRole;
    use crate::storage::MemoryStore;

    const POLL: Duration = Duration::from_millis(10);

    fn service(auditor: FixtureAuditor) -> ComparisonService {
        let orchestrator = AuditOrchestrator::new(
            Arc::new(auditor),
            Arc::new(MemoryStore::new()),
            AnalysisPolicy::default(),
            Duration::from_secs(5),
        );
        ComparisonService::new(orchestrator, 10, 50)
    }

    fn competitors(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    fn recorded() -> FixtureAuditor {
        FixtureAuditor::new()
            .with(
                "https://example.com/",
                FixtureEntry::result(site("https://example.com/", SiteRole::User, 65, 20, 10)),
            )
            .unwrap()
            .with(
                "https://a.com/",
                FixtureEntry::result(site("https://a.com/", SiteRole::Competitor, 78, 24, 16)),
            )
            .unwrap()
    }

    #[test]
    fn test_validate_normalizes_urls() {
        let service = service(FixtureAuditor::new());
        let request = service
            .validate_request("Example.com", &competitors(&["https://a.com/?utm_source=x"]), None)
            .unwrap();

        assert_eq!(request.user_url, "https://example.com/");
        assert_eq!(request.competitor_urls, vec!["https://a.com/"]);
        assert_eq!(request.max_pages, 10);
    }

    #[test]
    fn test_validate_competitor_count() {
        let service = service(FixtureAuditor::new());
        assert!(matches!(
            service.validate_request("example.com", &[], None),
            Err(ValidationError::CompetitorCount(0))
        ));
        let four = competitors(&["a.com", "b.com", "c.com", "d.com"]);
        assert!(matches!(
            service.validate_request("example.com", &four, None),
            Err(ValidationError::CompetitorCount(4))
        ));
    }

    #[test]
    fn test_validate_duplicates_ignore_scheme() {
        let service = service(FixtureAuditor::new());
        let result = service.validate_request(
            "https://example.com",
            &competitors(&["https://a.com", "http://www.example.com/"]),
            None,
        );
        assert!(matches!(
            result,
            Err(ValidationError::DuplicateUrl { url }) if url == "http://www.example.com/"
        ));
    }

    #[test]
    fn test_validate_max_pages() {
        let service = service(FixtureAuditor::new());
        let urls = competitors(&["a.com"]);
        assert!(matches!(
            service.validate_request("example.com", &urls, Some(0)),
            Err(ValidationError::MaxPages { got: 0, limit: 50 })
        ));
        assert!(service.validate_request("example.com", &urls, Some(51)).is_err());
        assert!(service.validate_request("example.com", &urls, Some(50)).is_ok());
    }

    #[test]
    fn test_validate_bad_url() {
        let service = service(FixtureAuditor::new());
        let result = service.validate_request("ftp://example.com", &competitors(&["a.com"]), None);
        assert!(matches!(result, Err(ValidationError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_start_and_collect_results() {
        let service = service(recorded());
        let id = service
            .start("https://example.com", &competitors(&["https://a.com"]), None)
            .unwrap();

        let view = service.wait(&id, POLL).await.unwrap();
        assert_eq!(view.status, JobStatus::Complete);
        assert_eq!(view.progress, 100);
        assert_eq!(view.sites_total, 2);

        match service.results(&id).unwrap() {
            JobResults::Ready(result) => {
                assert_eq!(result.summary.user_rank, Some(2));
                assert_eq!(result.rankings[0].url, "https://a.com/");
            }
            other => panic!("expected results, got {:?}", other),
        }
        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_results_not_ready_while_auditing() {
        let auditor = recorded()
            .with(
                "https://a.com/",
                FixtureEntry::result(site("https://a.com/", SiteRole::Competitor, 78, 24, 16))
                    .with_delay(Duration::from_secs(10)),
            )
            .unwrap();
        let service = service(auditor);
        let id = service
            .start("https://example.com", &competitors(&["https://a.com"]), None)
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(
            service.results(&id).unwrap(),
            JobResults::NotReady {
                status: JobStatus::Auditing,
                ..
            }
        ));

        let view = service.cancel(&id).await.unwrap();
        assert_eq!(view.status, JobStatus::Cancelled);
        assert_eq!(service.results(&id).unwrap(), JobResults::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_finished_job_is_rejected() {
        let service = service(recorded());
        let id = service
            .start("https://example.com", &competitors(&["https://a.com"]), None)
            .unwrap();
        service.wait(&id, POLL).await.unwrap();

        let err = service.cancel(&id).await.unwrap_err();
        assert!(matches!(
            err,
            RivalError::NotCancellable {
                status: JobStatus::Complete,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_cancel_orphaned_job() {
        let service = service(FixtureAuditor::new());
        let mut state = JobState::new(ComparisonJob::new(
            "https://example.com/".to_string(),
            vec!["https://a.com/".to_string()],
            5,
        ));
        state.job.begin_auditing().unwrap();
        service.store().save(&state).unwrap();

        let view = service.cancel(&state.job.id).await.unwrap();
        assert_eq!(view.status, JobStatus::Cancelled);
    }

    #[test]
    fn test_unknown_job() {
        let service = service(FixtureAuditor::new());
        let id = JobId::new();
        assert!(matches!(service.status(&id), Err(RivalError::JobNotFound(_))));
        assert!(matches!(service.results(&id), Err(RivalError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_job_results() {
        let auditor = FixtureAuditor::new()
            .with("https://example.com/", FixtureEntry::error("refused"))
            .unwrap()
            .with("https://a.com/", FixtureEntry::error("refused"))
            .unwrap();
        let service = service(auditor);
        let id = service
            .start("https://example.com", &competitors(&["https://a.com"]), None)
            .unwrap();

        let view = service.wait(&id, POLL).await.unwrap();
        assert_eq!(view.status, JobStatus::Failed);
        match service.results(&id).unwrap() {
            JobResults::Failed { error } => assert!(error.contains("all 2 site audits failed")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
