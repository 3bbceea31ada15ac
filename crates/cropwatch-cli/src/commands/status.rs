//! Status command implementation

use std::sync::Arc;

use crate::cli::StatusArgs;
use crate::commands::{job_api, report};
use crate::output::OutputWriter;
use crate::output_types::AnalysisOutput;
use crate::progress::{finish_error, finish_success, spinner_for};
use anyhow::Result;
use cropwatch_core::config::LayeredConfig;
use cropwatch_core::models::JobId;
use cropwatch_core::ports::JobApi;
use cropwatch_session::JobPoller;

pub async fn execute(args: StatusArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let api = Arc::new(job_api(config));
    let job_id = JobId::new(args.job_id);

    let job = if args.watch {
        let spinner = spinner_for(output.is_json(), &format!("Watching job {}...", job_id));
        let poller = JobPoller::new(api, config.poll_settings());
        poller.start(job_id.clone());

        match poller.wait_for_terminal().await {
            Some(job) => {
                finish_success(&spinner, &format!("Job {}", job.status));
                job
            }
            None => {
                finish_error(&spinner, "Polling stopped");
                anyhow::bail!("Stopped watching job {}", job_id);
            }
        }
    } else {
        api.fetch(&job_id).await?
    };

    if output.is_json() {
        output.result(AnalysisOutput { job, aoi: None })?;
    } else {
        report::print_job(&job, output)?;
        if let Some(failure) = job.failure() {
            output.error(failure.user_message());
        }
    }

    Ok(())
}
