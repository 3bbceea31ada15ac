//! In-memory adapters for development and testing.
//!
//! Both adapters are scriptable fakes: they record every call and can be
//! told to delay or fail. For real workloads, use the HTTP adapters.

use async_trait::async_trait;
use cropwatch_core::error::{CropwatchError, Result};
use cropwatch_core::models::{
    AnalysisRequest, JobId, JobSnapshot, JobStatus, SearchCandidate,
};
use cropwatch_core::ports::{Geocoder, JobApi};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Scripted in-memory job service
#[derive(Debug, Clone, Default)]
pub struct MemoryJobApi {
    state: Arc<Mutex<MemoryJobState>>,
}

#[derive(Debug, Default)]
struct MemoryJobState {
    jobs: HashMap<JobId, ScriptedJob>,
    next_ids: VecDeque<JobId>,
    submissions: Vec<AnalysisRequest>,
    fetches: Vec<JobId>,
    fetch_delays: HashMap<JobId, Duration>,
    failing_fetches: usize,
    rejection: Option<(u16, String)>,
    submit_delay: Option<Duration>,
}

/// A job whose fetches walk through a scripted list of snapshots.
/// The last snapshot repeats once the script is exhausted.
#[derive(Debug)]
struct ScriptedJob {
    script: VecDeque<JobSnapshot>,
    current: JobSnapshot,
}

impl ScriptedJob {
    fn new(job_id: JobId) -> Self {
        Self { script: VecDeque::new(), current: JobSnapshot::pending(job_id) }
    }

    fn advance(&mut self) -> JobSnapshot {
        if let Some(next) = self.script.pop_front() {
            self.current = next;
        }
        self.current.clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryJobApi {
    /// Create an empty job service
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `job_id` for the next submission instead of a random UUID
    pub fn issue_id(&self, job_id: impl Into<String>) -> &Self {
        lock(&self.state).next_ids.push_back(JobId::new(job_id));
        self
    }

    /// Responses returned by successive fetches of `job_id`
    pub fn script(&self, job_id: impl Into<String>, snapshots: Vec<JobSnapshot>) -> &Self {
        let job_id = JobId::new(job_id);
        let mut state = lock(&self.state);
        let job = state.jobs.entry(job_id.clone()).or_insert_with(|| ScriptedJob::new(job_id));
        job.script.extend(snapshots);
        self
    }

    /// Script bare status transitions for `job_id`
    pub fn script_statuses(&self, job_id: impl Into<String>, statuses: &[JobStatus]) -> &Self {
        let job_id: String = job_id.into();
        let snapshots = statuses
            .iter()
            .map(|status| JobSnapshot { status: *status, ..JobSnapshot::pending(JobId::new(job_id.clone())) })
            .collect();
        self.script(job_id, snapshots)
    }

    /// Answer every submission with an HTTP error
    pub fn reject_submissions(&self, status: u16, detail: impl Into<String>) -> &Self {
        lock(&self.state).rejection = Some((status, detail.into()));
        self
    }

    /// Hold every submission for `delay` before answering
    pub fn delay_submissions(&self, delay: Duration) -> &Self {
        lock(&self.state).submit_delay = Some(delay);
        self
    }

    /// Fail the next `count` fetches with a network error
    pub fn fail_next_fetches(&self, count: usize) -> &Self {
        lock(&self.state).failing_fetches = count;
        self
    }

    /// Hold every fetch of `job_id` for `delay` before answering
    pub fn delay_fetches(&self, job_id: impl Into<String>, delay: Duration) -> &Self {
        lock(&self.state).fetch_delays.insert(JobId::new(job_id), delay);
        self
    }

    /// Requests received so far
    pub fn submissions(&self) -> Vec<AnalysisRequest> {
        lock(&self.state).submissions.clone()
    }

    /// Number of fetches issued for `job_id`
    pub fn fetch_count(&self, job_id: &str) -> usize {
        lock(&self.state).fetches.iter().filter(|id| id.as_str() == job_id).count()
    }
}

#[async_trait]
impl JobApi for MemoryJobApi {
    async fn submit(&self, request: &AnalysisRequest) -> Result<JobId> {
        let (outcome, delay) = {
            let mut state = lock(&self.state);
            state.submissions.push(request.clone());

            let outcome = match state.rejection.clone() {
                Some((status, detail)) => Err(CropwatchError::Remote { status, detail }),
                None => {
                    let job_id = state
                        .next_ids
                        .pop_front()
                        .unwrap_or_else(|| JobId::new(uuid::Uuid::new_v4().to_string()));
                    state
                        .jobs
                        .entry(job_id.clone())
                        .or_insert_with(|| ScriptedJob::new(job_id.clone()));
                    Ok(job_id)
                }
            };
            (outcome, state.submit_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }

    async fn fetch(&self, job_id: &JobId) -> Result<JobSnapshot> {
        let (outcome, delay) = {
            let mut state = lock(&self.state);
            state.fetches.push(job_id.clone());
            let delay = state.fetch_delays.get(job_id).copied();

            let outcome = if state.failing_fetches > 0 {
                state.failing_fetches -= 1;
                Err(CropwatchError::network("Job status fetch", "connection reset"))
            } else {
                match state.jobs.get_mut(job_id) {
                    Some(job) => Ok(job.advance()),
                    None => Err(CropwatchError::Remote {
                        status: 404,
                        detail: "Job not found".to_string(),
                    }),
                }
            };
            (outcome, delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }

    async fn list_jobs(&self) -> Result<Vec<JobSnapshot>> {
        let state = lock(&self.state);
        let mut jobs: Vec<JobSnapshot> = state.jobs.values().map(|j| j.current.clone()).collect();
        jobs.sort_by(|a, b| a.job_id.as_str().cmp(b.job_id.as_str()));
        Ok(jobs)
    }
}

/// In-memory gazetteer that records every lookup
#[derive(Debug, Default)]
pub struct MemoryGeocoder {
    places: Vec<SearchCandidate>,
    calls: Mutex<Vec<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    failing: Mutex<bool>,
}

impl MemoryGeocoder {
    pub fn new(places: Vec<SearchCandidate>) -> Self {
        Self { places, ..Default::default() }
    }

    /// Hold lookups for exactly `query` for `delay` before answering
    pub fn delay_query(&self, query: impl Into<String>, delay: Duration) {
        lock(&self.delays).insert(query.into(), delay);
    }

    /// Make every lookup fail with a network error
    pub fn set_failing(&self, failing: bool) {
        *lock(&self.failing) = failing;
    }

    /// Queries received so far, in order
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl Geocoder for MemoryGeocoder {
    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<SearchCandidate>> {
        lock(&self.calls).push(query.to_string());
        let delay = lock(&self.delays).get(query).copied();

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *lock(&self.failing) {
            return Err(CropwatchError::network("Location search", "geocoder unreachable"));
        }

        let needle = query.trim().to_lowercase();
        Ok(self
            .places
            .iter()
            .filter(|place| place.label.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }
}
