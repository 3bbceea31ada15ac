//! Jobs command implementation

use std::sync::Arc;

use crate::cli::JobsArgs;
use crate::commands::{job_api, report};
use crate::output::OutputWriter;
use anyhow::Result;
use cropwatch_core::config::LayeredConfig;
use cropwatch_session::{AnalysisOrchestrator, HeadlessMap};

pub async fn execute(args: JobsArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let orchestrator = AnalysisOrchestrator::new(
        Arc::new(job_api(config)),
        Arc::new(HeadlessMap::new()),
        config.poll_settings(),
    );

    let mut jobs = orchestrator.list_jobs().await?;
    if let Some(limit) = args.limit {
        jobs.truncate(limit);
    }

    if !output.is_json() {
        output.section(format!("Analysis Jobs ({})", jobs.len()));
    }
    output.table(report::job_rows(&jobs))?;

    if jobs.is_empty() && !output.is_json() {
        output.info("Submit one with: cropwatch analyze --aoi field.geojson --start YYYY-MM-DD --end YYYY-MM-DD");
    }

    Ok(())
}
