//! Command implementations

mod analyze;
mod config;
mod jobs;
mod report;
mod search;
mod status;

use std::sync::Arc;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::errors::{self, CliError};
use crate::output::OutputWriter;
use anyhow::Result;
use cropwatch_client::{EnvCredentials, HttpJobApi};
use cropwatch_core::config::LayeredConfig;
use cropwatch_core::CropwatchError;

/// Execute a CLI command, reporting any failure before returning it
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    run(cli, &output).await.map_err(|e| report_failure(e, &output))
}

async fn run(cli: Cli, output: &OutputWriter) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Search(args) => search::execute(args, &config, output).await,
        Commands::Analyze(args) => analyze::execute(args, &config, output).await,
        Commands::Status(args) => status::execute(args, &config, output).await,
        Commands::Jobs(args) => jobs::execute(args, &config, output).await,
        Commands::Config => config::execute(&config, output),
    }
}

/// Print a failure the way its type asks for and return it for the exit code
fn report_failure(error: anyhow::Error, output: &OutputWriter) -> anyhow::Error {
    if output.is_json() {
        output.error(&error);
        return error;
    }

    if let Some(cli_error) = error.downcast_ref::<CliError>() {
        cli_error.display();
    } else if let Some(domain) = error.downcast_ref::<CropwatchError>() {
        errors::from_cropwatch(domain).display();
    } else {
        output.error(&error);
    }
    error
}

/// Job API client for the configured service, authenticated from the environment
fn job_api(config: &LayeredConfig) -> HttpJobApi {
    HttpJobApi::new(config.api_base_url.value.clone(), Arc::new(EnvCredentials))
}

/// Fail early with a helpful message when the service is down
async fn ensure_reachable(api: &HttpJobApi) -> Result<()> {
    if let Err(e) = api.health().await {
        return Err(errors::service_unreachable(api.base_url(), &e).into());
    }
    Ok(())
}
