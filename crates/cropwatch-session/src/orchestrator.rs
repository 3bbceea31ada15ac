//! Analysis orchestration: AOI and dates in, job status and overlay out

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use cropwatch_core::config::PollSettings;
use cropwatch_core::error::{CropwatchError, ErrorKind, Result};
use cropwatch_core::models::{
    AnalysisRequest, DateRange, JobId, JobSnapshot, JobStatus, Overlay, Polygon,
};
use cropwatch_core::ports::{JobApi, MapSurface};
use tokio::sync::watch;

use crate::poller::JobPoller;

/// Everything the analysis panel needs to render
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisView {
    pub polygon: Option<Polygon>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub crop_type: Option<String>,
    pub season: Option<String>,
    pub job_id: Option<JobId>,
    /// Latest accepted status of the current job
    pub job: Option<JobSnapshot>,
    pub submitting: bool,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub overlay: Option<Overlay>,
}

impl AnalysisView {
    /// Pending or processing, as opposed to idle or finished
    pub fn in_progress(&self) -> bool {
        self.job.as_ref().is_some_and(|job| !job.status.is_terminal())
    }
}

/// Owns the AOI, the date range, and the single active job.
///
/// Polygon changes arrive through [`AnalysisOrchestrator::on_polygon_change`];
/// a completed job's overlay is pushed back to the map surface.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    shared: Arc<OrchestratorShared>,
}

struct OrchestratorShared {
    api: Arc<dyn JobApi>,
    map: Arc<dyn MapSurface>,
    poller: JobPoller,
    state: Mutex<FormState>,
}

#[derive(Default)]
struct FormState {
    polygon: Option<Polygon>,
    start_date: Option<String>,
    end_date: Option<String>,
    crop_type: Option<String>,
    season: Option<String>,
    job_id: Option<JobId>,
    submitting: bool,
    error: Option<(ErrorKind, String)>,
    overlay: Option<Overlay>,
    /// Bumped by every reset; a submission outliving one is discarded
    generation: u64,
}

impl FormState {
    fn build_request(&self) -> Result<AnalysisRequest> {
        let polygon = self.polygon.as_ref().ok_or_else(|| {
            CropwatchError::validation("aoi", "Please draw an area of interest on the map")
        })?;
        let dates = DateRange::parse(self.start_date.as_deref(), self.end_date.as_deref())?;

        Ok(AnalysisRequest::new(polygon, &dates)
            .crop_type(self.crop_type.clone())
            .season(self.season.clone()))
    }

    fn record_error(&mut self, err: &CropwatchError) {
        self.error = Some((err.kind(), err.user_message()));
    }
}

/// Clears the in-flight flag when a submission ends, including when the
/// submitting future is dropped.
struct InFlight<'a>(&'a OrchestratorShared);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.lock().submitting = false;
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AnalysisOrchestrator {
    pub fn new(api: Arc<dyn JobApi>, map: Arc<dyn MapSurface>, settings: PollSettings) -> Self {
        let poller = JobPoller::new(api.clone(), settings);
        let shared = Arc::new(OrchestratorShared {
            api,
            map,
            poller,
            state: Mutex::new(FormState::default()),
        });

        let weak: Weak<OrchestratorShared> = Arc::downgrade(&shared);
        shared.poller.on_update(move |snapshot| {
            if let Some(shared) = weak.upgrade() {
                shared.job_updated(snapshot);
            }
        });

        Self { shared }
    }

    /// Replace the AOI; `None` means "no AOI".
    ///
    /// A job already submitted keeps running.
    pub fn on_polygon_change(&self, polygon: Option<Polygon>) {
        let mut state = self.shared.lock();
        match &polygon {
            Some(p) => tracing::debug!(vertices = p.vertex_count(), "AOI updated"),
            None => tracing::debug!("AOI cleared"),
        }
        state.polygon = polygon;
    }

    pub fn set_start_date(&self, date: Option<String>) {
        self.shared.lock().start_date = non_empty(date);
    }

    pub fn set_end_date(&self, date: Option<String>) {
        self.shared.lock().end_date = non_empty(date);
    }

    pub fn set_crop_type(&self, crop_type: Option<String>) {
        self.shared.lock().crop_type = non_empty(crop_type);
    }

    pub fn set_season(&self, season: Option<String>) {
        self.shared.lock().season = non_empty(season);
    }

    /// Submit the current form and start polling the new job.
    ///
    /// Validation errors issue no request. Remote errors are recorded for
    /// display and returned. When [`reset`](Self::reset) runs while the
    /// request is outstanding, its response is returned but neither tracked
    /// nor recorded.
    pub async fn submit(&self) -> Result<JobId> {
        let (request, generation) = {
            let mut state = self.shared.lock();
            if state.submitting {
                return Err(CropwatchError::SubmissionInFlight);
            }
            match state.build_request() {
                Ok(request) => {
                    state.submitting = true;
                    state.error = None;
                    (request, state.generation)
                }
                Err(e) => {
                    state.record_error(&e);
                    return Err(e);
                }
            }
        };

        let _in_flight = InFlight(&self.shared);
        tracing::info!(
            start = %request.start_date,
            end = %request.end_date,
            crop_type = ?request.crop_type,
            "Submitting analysis"
        );

        let result = self.shared.api.submit(&request).await;
        let mut state = self.shared.lock();
        if state.generation != generation {
            tracing::debug!(
                result = ?result.as_ref().map(JobId::as_str),
                "Discarding submission response after reset"
            );
            return result;
        }

        match result {
            Ok(job_id) => {
                state.job_id = Some(job_id.clone());
                state.overlay = None;
                // Started under the form lock so a concurrent reset stops it
                self.shared.poller.start(job_id.clone());
                drop(state);
                self.shared.map.set_overlay(None);
                Ok(job_id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Analysis submission failed");
                state.record_error(&e);
                Err(e)
            }
        }
    }

    /// Clear the AOI, the job, and any error; polling stops
    pub fn reset(&self) {
        {
            let mut state = self.shared.lock();
            state.generation += 1;
            state.polygon = None;
            state.job_id = None;
            state.error = None;
            state.overlay = None;
        }
        self.shared.poller.stop();
        self.shared.map.set_overlay(None);
        self.shared.map.clear_shapes();
    }

    /// Show or hide the analysis overlay without touching the job
    pub fn set_overlay_visible(&self, visible: bool) {
        let overlay = {
            let mut state = self.shared.lock();
            match state.overlay.as_mut() {
                Some(overlay) => {
                    overlay.visible = visible;
                    overlay.clone()
                }
                None => return,
            }
        };
        self.shared.map.set_overlay(Some(&overlay));
    }

    /// Jobs known to the remote service
    pub async fn list_jobs(&self) -> Result<Vec<JobSnapshot>> {
        self.shared.api.list_jobs().await
    }

    /// Wait until the current job completes or fails.
    ///
    /// Returns `None` when there is no job or it was reset first.
    pub async fn wait_for_result(&self) -> Option<JobSnapshot> {
        if self.shared.lock().job_id.is_none() {
            return None;
        }
        self.shared.poller.wait_for_terminal().await
    }

    /// Status updates accepted for the current job
    pub fn subscribe(&self) -> watch::Receiver<Option<JobSnapshot>> {
        self.shared.poller.subscribe()
    }

    pub fn view(&self) -> AnalysisView {
        let job = self.shared.poller.snapshot();
        let state = self.shared.lock();
        AnalysisView {
            polygon: state.polygon.clone(),
            start_date: state.start_date.clone(),
            end_date: state.end_date.clone(),
            crop_type: state.crop_type.clone(),
            season: state.season.clone(),
            job: job.filter(|j| state.job_id.as_ref() == Some(&j.job_id)),
            job_id: state.job_id.clone(),
            submitting: state.submitting,
            error: state.error.as_ref().map(|(_, message)| message.clone()),
            error_kind: state.error.as_ref().map(|(kind, _)| *kind),
            overlay: state.overlay.clone(),
        }
    }
}

impl OrchestratorShared {
    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn job_updated(&self, snapshot: &JobSnapshot) {
        let overlay = {
            let mut state = self.lock();
            if state.job_id.as_ref() != Some(&snapshot.job_id) {
                return;
            }

            match snapshot.status {
                JobStatus::Completed => {
                    if let Some(warning) = &snapshot.warning {
                        tracing::warn!(job_id = %snapshot.job_id, warning = %warning, "Analysis completed with warning");
                    }
                    state.overlay = snapshot
                        .rvi_map_url
                        .as_ref()
                        .map(|url| Overlay { url: url.clone(), visible: true });
                    state.overlay.clone()
                }
                JobStatus::Failed => {
                    if let Some(err) = snapshot.failure() {
                        state.record_error(&err);
                    }
                    return;
                }
                JobStatus::Pending | JobStatus::Processing => return,
            }
        };

        if let Some(overlay) = overlay {
            self.map.set_overlay(Some(&overlay));
        }
    }
}
