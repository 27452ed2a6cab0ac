//! Audit orchestrator - drives one job from queued to a terminal state
//!
//! This module contains the per-job flow, including:
//! - Fanning out one audit task per site, all started at once
//! - Isolating per-site failures, panics included
//! - Enforcing the job-level deadline and honoring cancellation
//! - Persisting monotonic progress as each site settles
//! - Running the analysis pipeline on the settled results

use crate::analysis::{analyze, AnalysisPolicy};
use crate::audit::{AuditError, Auditor};
use crate::model::{FailureReason, SiteAuditResult, SiteRole};
use crate::orchestrator::cancel::CancelToken;
use crate::state::ComparisonJob;
use crate::storage::{ComparisonStore, JobState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{Id, JoinError, JoinSet};
use tokio::time::Instant;

/// Attempts made to record a terminal state before giving up
const TERMINAL_WRITE_ATTEMPTS: u32 = 3;

/// How the auditing phase ended
enum Gathered {
    /// Every site settled or was timed out; results are in request order
    Settled(Vec<SiteAuditResult>),
    Cancelled,
}

/// Runs comparison jobs against an auditor and a store
pub struct AuditOrchestrator {
    auditor: Arc<dyn Auditor>,
    store: Arc<dyn ComparisonStore>,
    policy: AnalysisPolicy,
    job_timeout: Duration,
}

impl AuditOrchestrator {
    pub fn new(
        auditor: Arc<dyn Auditor>,
        store: Arc<dyn ComparisonStore>,
        policy: AnalysisPolicy,
        job_timeout: Duration,
    ) -> Self {
        Self {
            auditor,
            store,
            policy,
            job_timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn ComparisonStore> {
        &self.store
    }

    /// Drives a queued job to `complete`, `failed` or `cancelled`
    ///
    /// Every error is captured into the returned state; nothing is thrown
    /// to the caller. The final state is also written to the store.
    pub async fn run(&self, job: ComparisonJob, cancel: CancelToken) -> JobState {
        let mut state = JobState::new(job);
        let job_id = state.job.id;

        if cancel.is_cancelled() {
            self.finish_cancelled(&mut state).await;
            return state;
        }

        if let Err(e) = state.job.begin_auditing() {
            tracing::error!("Job {} cannot start auditing: {}", job_id, e);
            return state;
        }
        tracing::info!(
            "Job {}: auditing {} sites (max {} pages each)",
            job_id,
            state.job.sites_total,
            state.job.max_pages
        );
        self.persist(&state);

        let results = match self.gather(&mut state, &cancel).await {
            Gathered::Settled(results) => results,
            Gathered::Cancelled => {
                self.finish_cancelled(&mut state).await;
                return state;
            }
        };

        // A cancel that raced the last site still wins while the job is auditing
        if cancel.is_cancelled() {
            self.finish_cancelled(&mut state).await;
            return state;
        }

        if results.iter().all(|r| !r.is_success()) {
            let message = summarize_failures(&results);
            tracing::error!("Job {} failed: {}", job_id, message);
            if let Err(e) = state.job.fail(message) {
                tracing::error!("Job {}: {}", job_id, e);
            }
            self.persist_terminal(&state).await;
            return state;
        }

        if let Err(e) = state.job.begin_analysis() {
            tracing::error!("Job {} cannot start analysis: {}", job_id, e);
            return state;
        }
        tracing::info!("Job {}: analyzing", job_id);
        self.persist(&state);

        match analyze(&results, &self.policy) {
            Ok(result) => {
                state.result = Some(result);
                if let Err(e) = state.job.complete() {
                    tracing::error!("Job {}: {}", job_id, e);
                    state.result = None;
                } else {
                    tracing::info!("Job {} complete", job_id);
                }
            }
            Err(e) => {
                tracing::error!("Job {} analysis failed: {}", job_id, e);
                if let Err(e) = state.job.fail(format!("analysis failed: {}", e)) {
                    tracing::error!("Job {}: {}", job_id, e);
                }
            }
        }

        self.persist_terminal(&state).await;
        state
    }

    /// Scatter/gather over every site of the job
    async fn gather(&self, state: &mut JobState, cancel: &CancelToken) -> Gathered {
        let requests: Vec<(String, SiteRole)> = state
            .job
            .site_urls()
            .enumerate()
            .map(|(index, url)| {
                let role = if index == 0 {
                    SiteRole::User
                } else {
                    SiteRole::Competitor
                };
                (url.to_string(), role)
            })
            .collect();

        let max_pages = state.job.max_pages;
        let mut slots: Vec<Option<SiteAuditResult>> = vec![None; requests.len()];
        let mut tasks = JoinSet::new();
        let mut positions: HashMap<Id, usize> = HashMap::with_capacity(requests.len());

        for (index, (url, _)) in requests.iter().enumerate() {
            let auditor = Arc::clone(&self.auditor);
            let token = cancel.clone();
            let url = url.clone();

            let handle = tasks.spawn(async move {
                tokio::select! {
                    result = auditor.audit(&url, max_pages) => Some(result),
                    _ = token.cancelled() => None,
                }
            });
            positions.insert(handle.id(), index);
        }

        let deadline = tokio::time::sleep_until(Instant::now() + self.job_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!("Job {}: cancellation requested", state.job.id);
                    tasks.abort_all();
                    return Gathered::Cancelled;
                }

                _ = &mut deadline => {
                    let unsettled = slots.iter().filter(|s| s.is_none()).count();
                    tracing::warn!(
                        "Job {}: deadline of {}s passed with {} sites unsettled",
                        state.job.id,
                        self.job_timeout.as_secs(),
                        unsettled
                    );
                    tasks.abort_all();
                    for _ in 0..unsettled {
                        self.record_settled(state);
                    }
                    break;
                }

                joined = tasks.join_next_with_id() => {
                    let Some(joined) = joined else {
                        break;
                    };
                    // A panicked task still reports its id through the error
                    let (id, joined) = match joined {
                        Ok((id, outcome)) => (id, Ok(outcome)),
                        Err(e) => (e.id(), Err(e)),
                    };
                    let Some(&index) = positions.get(&id) else {
                        continue;
                    };
                    let (url, role) = &requests[index];
                    slots[index] = Some(settle(url, *role, joined));
                    self.record_settled(state);
                }
            }
        }

        let results = slots
            .into_iter()
            .zip(requests)
            .map(|(slot, (url, role))| {
                slot.unwrap_or_else(|| SiteAuditResult::failed(url, role, FailureReason::Timeout))
            })
            .collect();
        Gathered::Settled(results)
    }

    fn record_settled(&self, state: &mut JobState) {
        match state.job.record_site_settled() {
            Ok(progress) => {
                tracing::info!(
                    "Job {}: {}/{} sites settled ({}%)",
                    state.job.id,
                    state.job.sites_completed,
                    state.job.sites_total,
                    progress
                );
                self.persist(state);
            }
            Err(e) => tracing::warn!("Job {}: {}", state.job.id, e),
        }
    }

    async fn finish_cancelled(&self, state: &mut JobState) {
        match state.job.cancel() {
            Ok(()) => {
                tracing::info!("Job {} cancelled", state.job.id);
                self.persist_terminal(state).await;
            }
            Err(e) => tracing::warn!("Job {}: {}", state.job.id, e),
        }
    }

    /// Writes a progress update; failures are logged and the next write
    /// carries the full state again
    fn persist(&self, state: &JobState) {
        if let Err(e) = self.store.save(state) {
            tracing::warn!("Job {}: failed to store state: {}", state.job.id, e);
        }
    }

    async fn persist_terminal(&self, state: &JobState) {
        for attempt in 1..=TERMINAL_WRITE_ATTEMPTS {
            match self.store.save(state) {
                Ok(()) => return,
                Err(e) => tracing::warn!(
                    "Job {}: failed to store {} state (attempt {}/{}): {}",
                    state.job.id,
                    state.job.status,
                    attempt,
                    TERMINAL_WRITE_ATTEMPTS,
                    e
                ),
            }
            if attempt < TERMINAL_WRITE_ATTEMPTS {
                tokio::time::sleep(Duration::from_millis(50 * u64::from(attempt))).await;
            }
        }
        tracing::error!(
            "Job {}: giving up on storing the {} state",
            state.job.id,
            state.job.status
        );
    }
}

/// Converts one joined audit task into a result for `url`
fn settle(
    url: &str,
    role: SiteRole,
    joined: Result<Option<Result<SiteAuditResult, AuditError>>, JoinError>,
) -> SiteAuditResult {
    match joined {
        Ok(Some(Ok(mut result))) => {
            result.url = url.to_string();
            result.role = role;
            match result.failure_reason() {
                None => tracing::debug!("Audit of {} scored {}", url, result.total_score),
                Some(reason) => tracing::warn!("Audit of {} failed: {}", url, reason),
            }
            result
        }
        Ok(Some(Err(e))) => {
            tracing::warn!("Audit of {} failed: {}", url, e);
            SiteAuditResult::failed(url, role, FailureReason::Error(e.to_string()))
        }
        Ok(None) => SiteAuditResult::failed(url, role, FailureReason::Cancelled),
        Err(e) if e.is_panic() => {
            tracing::warn!("Audit task for {} panicked", url);
            SiteAuditResult::failed(url, role, FailureReason::Panicked)
        }
        Err(_) => SiteAuditResult::failed(url, role, FailureReason::Cancelled),
    }
}

fn summarize_failures(results: &[SiteAuditResult]) -> String {
    let details: Vec<String> = results
        .iter()
        .filter_map(|r| r.failure_reason().map(|reason| format!("{}: {}", r.url, reason)))
        .collect();
    format!(
        "all {} site audits failed: {}",
        results.len(),
        details.join("; ")
    )
}
