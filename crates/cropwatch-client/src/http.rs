//! HTTP adapter for the analysis job API

use std::sync::Arc;

use async_trait::async_trait;
use cropwatch_core::error::{CropwatchError, Result};
use cropwatch_core::models::{AnalysisRequest, JobId, JobSnapshot, SubmitResponse};
use cropwatch_core::ports::{CredentialProvider, JobApi};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::credentials::NoCredentials;

/// Job API client
pub struct HttpJobApi {
    /// Base URL of the backend (e.g., "http://localhost:8000")
    base_url: String,

    /// Source of the bearer token attached to each request
    credentials: Arc<dyn CredentialProvider>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpJobApi {
    /// Create a new job API client
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            client: reqwest::Client::new(),
        }
    }

    /// Create with default localhost URL and no credentials
    pub fn localhost() -> Self {
        Self::new(cropwatch_core::config::DEFAULT_API_BASE_URL, Arc::new(NoCredentials))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the backend is reachable (`GET /health`)
    pub async fn health(&self) -> Result<()> {
        let response = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| CropwatchError::network("Health check", e))?;

        let body: HealthResponse = read_json(response, "Health check").await?;
        if body.status == "ok" {
            Ok(())
        } else {
            Err(CropwatchError::network("Health check", format!("status '{}'", body.status)))
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/api/result/{id}` with the opaque id encoded as a single path segment
    fn result_url(&self, job_id: &JobId) -> Result<reqwest::Url> {
        let invalid = |reason: String| CropwatchError::ConfigInvalid {
            key: "api_base_url".to_string(),
            reason,
        };

        let mut url = reqwest::Url::parse(&self.url("/api/result"))
            .map_err(|e| invalid(format!("Invalid URL '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("'{}' cannot be a base URL", self.base_url)))?
            .push(job_id.as_str());
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn submit(&self, request: &AnalysisRequest) -> Result<JobId> {
        let response = self
            .authorize(self.client.post(self.url("/api/analyze")).json(request))
            .send()
            .await
            .map_err(|e| CropwatchError::network("Job submission", e))?;

        let body: SubmitResponse = read_json(response, "Job submission").await?;
        tracing::info!(job_id = %body.job_id, status = %body.status, "Analysis job created");
        Ok(body.job_id)
    }

    async fn fetch(&self, job_id: &JobId) -> Result<JobSnapshot> {
        let response = self
            .authorize(self.client.get(self.result_url(job_id)?))
            .send()
            .await
            .map_err(|e| CropwatchError::network("Job status fetch", e))?;

        read_json(response, "Job status fetch").await
    }

    async fn list_jobs(&self) -> Result<Vec<JobSnapshot>> {
        let response = self
            .authorize(self.client.get(self.url("/api/jobs")))
            .send()
            .await
            .map_err(|e| CropwatchError::network("Job listing", e))?;

        read_json(response, "Job listing").await
    }
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// Decode a success body, or turn an error status into `CropwatchError::Remote`
async fn read_json<T: DeserializeOwned>(response: reqwest::Response, operation: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CropwatchError::Remote {
            status: status.as_u16(),
            detail: error_detail(&body),
        });
    }

    response
        .json()
        .await
        .map_err(|e| CropwatchError::network(operation, format!("unreadable response: {}", e)))
}

/// Extract the user-facing message from an error body.
///
/// The backend answers `{"detail": "..."}` for handled errors and
/// `{"detail": [{"msg": "..."}, ...]}` for request validation failures.
pub fn error_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    match value.get("detail") {
        Some(serde_json::Value::String(detail)) => detail.clone(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
            .collect::<Vec<_>>()
            .join("; "),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentials;

    #[test]
    fn test_client_creation() {
        let api = HttpJobApi::localhost();
        assert_eq!(api.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let api = HttpJobApi::new("https://crops.example.org/", Arc::new(StaticCredentials::new("t")));
        assert_eq!(api.url("/api/jobs"), "https://crops.example.org/api/jobs");
    }

    #[test]
    fn test_result_url_encodes_job_id() {
        let api = HttpJobApi::new("https://crops.example.org/v1", Arc::new(NoCredentials));

        let url = api.result_url(&JobId::new("job-123")).unwrap();
        assert_eq!(url.as_str(), "https://crops.example.org/v1/api/result/job-123");

        let url = api.result_url(&JobId::new("a/b c?x")).unwrap();
        assert_eq!(url.path(), "/v1/api/result/a%2Fb%20c%3Fx");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_error_detail_string() {
        assert_eq!(error_detail(r#"{"detail": "Job not found"}"#), "Job not found");
    }

    #[test]
    fn test_error_detail_validation_list() {
        let body = r#"{"detail": [
            {"loc": ["body", "start_date"], "msg": "Value error, Invalid date format: 2024/01/01. Use YYYY-MM-DD.", "type": "value_error"},
            {"loc": ["body", "aoi_geojson"], "msg": "Value error, aoi_geojson must be a GeoJSON Polygon or Feature.", "type": "value_error"}
        ]}"#;
        let detail = error_detail(body);
        assert!(detail.contains("Invalid date format"));
        assert!(detail.contains("; "));
    }

    #[test]
    fn test_error_detail_non_json() {
        assert_eq!(error_detail("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_detail(r#"{"message": "nope"}"#), "");
    }
}
