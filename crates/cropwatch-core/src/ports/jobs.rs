use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AnalysisRequest, JobId, JobSnapshot};

/// Port for the remote analysis job service
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Create a job (`POST /api/analyze`) and return its identifier
    async fn submit(&self, request: &AnalysisRequest) -> Result<JobId>;

    /// Fetch the current state of a job (`GET /api/result/{job_id}`)
    async fn fetch(&self, job_id: &JobId) -> Result<JobSnapshot>;

    /// List the caller's jobs (`GET /api/jobs`)
    async fn list_jobs(&self) -> Result<Vec<JobSnapshot>>;
}
