//! Human-readable rendering of job snapshots

use crate::output::OutputWriter;
use crate::output_types::{JobRow, TimeSeriesRow};
use anyhow::Result;
use cropwatch_core::models::{JobSnapshot, JobStatus};

pub fn print_job(job: &JobSnapshot, output: &OutputWriter) -> Result<()> {
    output.section("Analysis Job");
    output.kv("Job", &job.job_id);
    output.kv("Status", job.status);

    if let Some(prediction) = &job.prediction {
        output.section("Prediction");
        output.kv("Label", &prediction.label);
        output.kv("Confidence", format!("{:.1}%", prediction.confidence));
        output.kv(
            "Probabilities",
            format!(
                "healthy {:.1}% / normal {:.1}% / stressed {:.1}%",
                prediction.healthy, prediction.normal, prediction.stressed
            ),
        );
    }

    if let Some(points) = job.time_series.as_deref().filter(|p| !p.is_empty()) {
        output.section("Time Series");
        output.table(points.iter().map(TimeSeriesRow::from).collect())?;
    }

    if let Some(url) = &job.rvi_map_url {
        output.kv("RVI overlay", url);
    }

    if let Some(warning) = &job.warning {
        output.warning(warning);
    }

    match job.status {
        JobStatus::Pending | JobStatus::Processing => {
            output.info(format!("Job is still running. Check again with: cropwatch status {} --watch", job.job_id));
        }
        JobStatus::Completed if job.warning.is_none() => output.success("Analysis complete"),
        _ => {}
    }

    Ok(())
}

pub fn job_rows(jobs: &[JobSnapshot]) -> Vec<JobRow> {
    jobs.iter().map(JobRow::from).collect()
}
