//! Fixed-interval job status polling

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use cropwatch_core::config::PollSettings;
use cropwatch_core::error::Result;
use cropwatch_core::models::{JobId, JobSnapshot};
use cropwatch_core::ports::JobApi;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::task::TaskGuard;

type UpdateListener = Arc<dyn Fn(&JobSnapshot) + Send + Sync>;

/// Drives one tracked job to a terminal status.
///
/// At most one poll session exists per poller. Clones share the session, so
/// any holder can stop it. The interval task only holds a weak reference;
/// dropping the last handle cancels polling.
#[derive(Clone)]
pub struct JobPoller {
    shared: Arc<PollShared>,
}

struct PollShared {
    api: Arc<dyn JobApi>,
    settings: PollSettings,
    inner: Mutex<PollInner>,
    updates: watch::Sender<Option<JobSnapshot>>,
    listener: Mutex<Option<UpdateListener>>,
}

#[derive(Default)]
struct PollInner {
    tracked: Option<JobId>,
    snapshot: Option<JobSnapshot>,
    session: Option<TaskGuard>,
}

impl JobPoller {
    pub fn new(api: Arc<dyn JobApi>, settings: PollSettings) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            shared: Arc::new(PollShared {
                api,
                settings,
                inner: Mutex::new(PollInner::default()),
                updates,
                listener: Mutex::new(None),
            }),
        }
    }

    /// Register the callback invoked after every accepted status update
    pub fn on_update<F>(&self, listener: F)
    where
        F: Fn(&JobSnapshot) + Send + Sync + 'static,
    {
        *self.shared.listener.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::new(listener));
    }

    /// Start tracking `job_id`.
    ///
    /// The previous session is cancelled before the new one is created. The
    /// first fetch goes out immediately, then one per interval until a
    /// terminal status arrives.
    pub fn start(&self, job_id: JobId) {
        let mut inner = self.shared.lock();
        inner.session = None;
        inner.tracked = Some(job_id.clone());
        inner.snapshot = Some(JobSnapshot::pending(job_id.clone()));
        // Published before the first fetch can possibly be applied
        self.shared.updates.send_replace(inner.snapshot.clone());

        tracing::info!(job_id = %job_id, interval = ?self.shared.settings.interval, "Polling job");
        let weak = Arc::downgrade(&self.shared);
        let period = self.shared.settings.interval;

        inner.session = Some(TaskGuard::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(shared) = weak.upgrade() else { break };
                PollShared::spawn_fetch(&shared, job_id.clone());
            }
        }));
    }

    /// Cancel polling and forget the tracked job
    pub fn stop(&self) {
        let mut inner = self.shared.lock();
        if let Some(job_id) = inner.tracked.take() {
            tracing::debug!(job_id = %job_id, "Polling stopped");
        }
        inner.session = None;
        inner.snapshot = None;
        self.shared.updates.send_replace(None);
    }

    pub fn tracked(&self) -> Option<JobId> {
        self.shared.lock().tracked.clone()
    }

    /// Latest accepted status of the tracked job
    pub fn snapshot(&self) -> Option<JobSnapshot> {
        self.shared.lock().snapshot.clone()
    }

    /// Whether an interval is still scheduled
    pub fn is_active(&self) -> bool {
        self.shared.lock().session.as_ref().is_some_and(|s| !s.is_finished())
    }

    /// Receive every accepted status update
    pub fn subscribe(&self) -> watch::Receiver<Option<JobSnapshot>> {
        self.shared.updates.subscribe()
    }

    /// Wait for the tracked job to reach a terminal status.
    ///
    /// Returns `None` when polling is stopped first.
    pub async fn wait_for_terminal(&self) -> Option<JobSnapshot> {
        let mut updates = self.subscribe();
        loop {
            match updates.borrow_and_update().clone() {
                Some(snapshot) if snapshot.status.is_terminal() => return Some(snapshot),
                None => return None,
                Some(_) => {}
            }
            if updates.changed().await.is_err() {
                return None;
            }
        }
    }
}

impl PollShared {
    fn lock(&self) -> MutexGuard<'_, PollInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches are detached from the interval and may overlap; each response
    /// is tagged with the job it was issued for.
    fn spawn_fetch(shared: &Arc<Self>, job_id: JobId) {
        let api = shared.api.clone();
        let weak: Weak<Self> = Arc::downgrade(shared);

        tokio::spawn(async move {
            let result = api.fetch(&job_id).await;
            if let Some(shared) = weak.upgrade() {
                shared.apply(&job_id, result);
            }
        });
    }

    fn apply(&self, job_id: &JobId, result: Result<JobSnapshot>) {
        let mut snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Status fetch failed, will retry");
                return;
            }
        };
        snapshot.job_id = job_id.clone();

        {
            let mut inner = self.lock();
            if inner.tracked.as_ref() != Some(job_id) {
                tracing::debug!(job_id = %job_id, "Discarding status for superseded job");
                return;
            }
            if inner.snapshot.as_ref().is_some_and(|s| s.status.is_terminal()) {
                return;
            }

            if snapshot.status.is_terminal() {
                tracing::info!(job_id = %job_id, status = %snapshot.status, "Job finished");
                inner.session = None;
            } else {
                tracing::debug!(job_id = %job_id, status = %snapshot.status, "Job status");
            }
            inner.snapshot = Some(snapshot.clone());
        }

        // The listener sees the update before any watcher is woken
        let listener = self.listener.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(listener) = listener {
            listener(&snapshot);
        }

        // Overlapping fetches may finish out of order; always publish the
        // latest accepted state, and nothing once the job is superseded
        let inner = self.lock();
        if inner.tracked.as_ref() == Some(job_id) {
            self.updates.send_replace(inner.snapshot.clone());
        }
    }
}
