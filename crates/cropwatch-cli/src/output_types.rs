use cropwatch_core::config::ConfigSource;
use cropwatch_core::models::{JobSnapshot, MapView, SearchCandidate, TimeSeriesPoint};
use cropwatch_geo::AoiMetrics;
use serde::Serialize;
use tabled::Tabled;

/// Output for search command
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub query: String,
    pub place: SearchCandidate,
    pub short_label: String,
    pub view: Option<MapView>,
}

/// Output for analyze, and for status when a job is shown in full
#[derive(Debug, Serialize)]
pub struct AnalysisOutput {
    pub job: JobSnapshot,
    pub aoi: Option<AoiMetrics>,
}

/// One row of the jobs listing
#[derive(Debug, Serialize, Tabled)]
pub struct JobRow {
    #[tabled(rename = "Job")]
    pub job_id: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Prediction")]
    pub label: String,
    #[tabled(rename = "Confidence")]
    pub confidence: String,
    #[tabled(rename = "Note")]
    pub note: String,
}

impl From<&JobSnapshot> for JobRow {
    fn from(job: &JobSnapshot) -> Self {
        let (label, confidence) = match &job.prediction {
            Some(p) => (p.label.clone(), format!("{:.1}%", p.confidence)),
            None => ("-".to_string(), "-".to_string()),
        };
        Self {
            job_id: job.job_id.to_string(),
            status: job.status.to_string(),
            label,
            confidence,
            note: job.error.clone().or_else(|| job.warning.clone()).unwrap_or_default(),
        }
    }
}

/// One acquisition in the result time series
#[derive(Debug, Serialize, Tabled)]
pub struct TimeSeriesRow {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "RVI mean")]
    pub rvi_mean: String,
    #[tabled(rename = "RVI median")]
    pub rvi_median: String,
    #[tabled(rename = "VV/VH")]
    pub vv_vh_ratio: String,
}

fn fixed(value: Option<f64>) -> String {
    value.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "-".to_string())
}

impl From<&TimeSeriesPoint> for TimeSeriesRow {
    fn from(point: &TimeSeriesPoint) -> Self {
        Self {
            date: point.date.clone(),
            rvi_mean: fixed(point.rvi_mean),
            rvi_median: fixed(point.rvi_median),
            vv_vh_ratio: fixed(point.vv_vh_ratio),
        }
    }
}

/// One configuration key with its origin
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

impl ConfigRow {
    pub fn new(key: &str, value: &str, source: ConfigSource) -> Self {
        Self { key: key.to_string(), value: value.to_string(), source: format!("{:?}", source) }
    }
}
