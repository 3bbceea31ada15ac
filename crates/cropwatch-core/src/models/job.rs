//! Analysis job models mirroring the job API wire format

use super::geometry::Polygon;
use crate::error::{CropwatchError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Opaque job identifier issued by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// `completed` and `failed` end the job; no further change is expected
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class probabilities (percent, one decimal) and the winning label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub healthy: f64,
    pub normal: f64,
    pub stressed: f64,
    pub confidence: f64,
    /// "Healthy", "Normal", or "Stressed"
    pub label: String,
}

/// One Sentinel-1 acquisition date in the result time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TimeSeriesPoint {
    pub date: String,
    #[serde(default)]
    pub rvi_mean: Option<f64>,
    #[serde(default)]
    pub rvi_median: Option<f64>,
    #[serde(default)]
    pub rvi_std: Option<f64>,
    #[serde(default)]
    pub vv_mean: Option<f64>,
    #[serde(default)]
    pub vh_mean: Option<f64>,
    #[serde(default)]
    pub vv_vh_ratio: Option<f64>,
}

/// `GET /api/result/{job_id}` response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub prediction: Option<Prediction>,
    #[serde(default)]
    pub time_series: Option<Vec<TimeSeriesPoint>>,
    #[serde(default)]
    pub rvi_map_url: Option<String>,
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobSnapshot {
    /// Snapshot for a freshly created job that has not been fetched yet
    pub fn pending(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            prediction: None,
            time_series: None,
            rvi_map_url: None,
            warning: None,
            error: None,
        }
    }

    /// The failure as a typed error, if the job failed
    pub fn failure(&self) -> Option<CropwatchError> {
        (self.status == JobStatus::Failed).then(|| CropwatchError::RemoteJob {
            job_id: self.job_id.to_string(),
            reason: self.error.clone().unwrap_or_else(|| "Analysis failed".to_string()),
        })
    }
}

/// `POST /api/analyze` request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub aoi_geojson: serde_json::Value,
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
}

impl AnalysisRequest {
    pub fn new(polygon: &Polygon, dates: &DateRange) -> Self {
        Self {
            aoi_geojson: polygon.to_geojson(),
            start_date: dates.start.format("%Y-%m-%d").to_string(),
            end_date: dates.end.format("%Y-%m-%d").to_string(),
            crop_type: None,
            season: None,
        }
    }

    pub fn crop_type(mut self, crop_type: Option<String>) -> Self {
        self.crop_type = crop_type;
        self
    }

    pub fn season(mut self, season: Option<String>) -> Self {
        self.season = season;
        self
    }
}

/// `POST /api/analyze` response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: JobId,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub message: String,
}

/// Validated analysis window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Parse form inputs. Missing or blank dates, non-ISO dates, and a start
    /// after the end are validation errors naming the offending field.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let start = parse_date("start_date", "start", start)?;
        let end = parse_date("end_date", "end", end)?;

        if start > end {
            return Err(CropwatchError::validation(
                "end_date",
                format!("End date {} is before start date {}", end, start),
            ));
        }

        Ok(Self { start, end })
    }
}

fn parse_date(field: &str, label: &str, value: Option<&str>) -> Result<NaiveDate> {
    let value = value.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(|| {
        CropwatchError::validation(field, format!("Please select a {} date", label))
    })?;

    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        CropwatchError::validation(field, format!("Invalid date format: {}. Use YYYY-MM-DD.", value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminality() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_snapshot_from_wire() {
        let json = r#"{
            "job_id": "job-123",
            "status": "completed",
            "prediction": {"healthy": 10.0, "normal": 8.0, "stressed": 82.0, "confidence": 82.0, "label": "Stressed"},
            "time_series": [{"date": "2024-01-05", "rvi_mean": 0.42, "vv_mean": null}],
            "rvi_map_url": "https://tiles.example/{z}/{x}/{y}",
            "warning": null,
            "error": null
        }"#;

        let snapshot: JobSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.job_id, JobId::new("job-123"));
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.prediction.as_ref().unwrap().label, "Stressed");
        let series = snapshot.time_series.unwrap();
        assert_eq!(series[0].rvi_mean, Some(0.42));
        assert_eq!(series[0].vv_mean, None);
        assert_eq!(series[0].rvi_std, None);
    }

    #[test]
    fn test_failure_carries_remote_error() {
        let mut snapshot = JobSnapshot::pending(JobId::new("j1"));
        assert!(snapshot.failure().is_none());

        snapshot.status = JobStatus::Failed;
        snapshot.error = Some("Earth Engine quota exceeded".into());
        match snapshot.failure() {
            Some(CropwatchError::RemoteJob { reason, .. }) => {
                assert_eq!(reason, "Earth Engine quota exceeded")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_date_range_validation() {
        let range = DateRange::parse(Some("2024-01-01"), Some("2024-06-01")).unwrap();
        assert_eq!(range.start.to_string(), "2024-01-01");

        let missing = DateRange::parse(None, Some("2024-06-01")).unwrap_err();
        assert!(matches!(missing, CropwatchError::Validation { ref field, .. } if field == "start_date"));

        let blank = DateRange::parse(Some("2024-01-01"), Some("  ")).unwrap_err();
        assert!(matches!(blank, CropwatchError::Validation { ref field, .. } if field == "end_date"));

        assert!(DateRange::parse(Some("01/02/2024"), Some("2024-06-01")).is_err());
        assert!(DateRange::parse(Some("2024-06-01"), Some("2024-01-01")).is_err());
    }

    #[test]
    fn test_request_omits_absent_optionals() {
        let polygon =
            Polygon::from_positions(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).unwrap();
        let dates = DateRange::parse(Some("2024-01-01"), Some("2024-06-01")).unwrap();
        let request = AnalysisRequest::new(&polygon, &dates);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["start_date"], "2024-01-01");
        assert_eq!(json["aoi_geojson"]["type"], "Polygon");
        assert!(json.get("crop_type").is_none());

        let json = serde_json::to_value(request.crop_type(Some("rice".into()))).unwrap();
        assert_eq!(json["crop_type"], "rice");
    }
}
