use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cropwatch - crop health analysis client
#[derive(Parser, Debug)]
#[command(name = "cropwatch")]
#[command(about = "Crop health analysis client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./cropwatch.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Analysis service base URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Geocoding search endpoint
    #[arg(long, global = true, value_name = "URL")]
    pub geocode_url: Option<String>,

    /// Seconds between job status checks
    #[arg(long, global = true, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find a place and show where the map would center
    Search(SearchArgs),

    /// Submit an area of interest for crop health analysis
    Analyze(AnalyzeArgs),

    /// Show the status of an analysis job
    Status(StatusArgs),

    /// List analysis jobs
    Jobs(JobsArgs),

    /// Show the effective configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Place name (e.g., "Bandung")
    pub query: String,

    /// Pick from suggestions instead of taking the best match
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// GeoJSON file with the area of interest (Polygon geometry or Feature)
    #[arg(long, value_name = "FILE")]
    pub aoi: PathBuf,

    /// First acquisition date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,

    /// Last acquisition date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,

    /// Crop type hint (e.g., "rice")
    #[arg(long)]
    pub crop_type: Option<String>,

    /// Season hint (e.g., "wet")
    #[arg(long)]
    pub season: Option<String>,

    /// Print the job id and return without waiting for the result
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Job identifier returned by `analyze`
    pub job_id: String,

    /// Keep polling until the job completes or fails
    #[arg(long, short = 'w')]
    pub watch: bool,
}

#[derive(Parser, Debug)]
pub struct JobsArgs {
    /// Show at most this many jobs
    #[arg(long)]
    pub limit: Option<usize>,
}
