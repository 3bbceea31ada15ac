//! Analyze command implementation

use std::fs;
use std::sync::Arc;

use crate::cli::AnalyzeArgs;
use crate::commands::{ensure_reachable, job_api, report};
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::AnalysisOutput;
use crate::progress::{finish_error, finish_success, spinner_for};
use anyhow::Result;
use cropwatch_core::config::LayeredConfig;
use cropwatch_core::models::DateRange;
use cropwatch_core::ports::MapSurface;
use cropwatch_geo::{aoi_metrics, fit_view, DrawEvent, DrawingSession, GeoJsonShape};
use cropwatch_session::{AnalysisOrchestrator, HeadlessMap};

pub async fn execute(args: AnalyzeArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let path = args.aoi.display().to_string();
    let content =
        fs::read_to_string(&args.aoi).map_err(|e| errors::aoi_unreadable(&path, &e.to_string()))?;
    let shape = GeoJsonShape::parse("aoi", &content)
        .map_err(|e| errors::aoi_unreadable(&path, &e.to_string()))?;

    // Validate dates before touching the network
    DateRange::parse(args.start.as_deref(), args.end.as_deref())?;

    let api = Arc::new(job_api(config));
    let map = Arc::new(HeadlessMap::new());
    map.set_base_layer(&config.tile_url.value);

    let orchestrator = AnalysisOrchestrator::new(api.clone(), map.clone(), config.poll_settings());
    let sink = orchestrator.clone();
    let mut drawing = DrawingSession::new(map.clone(), move |polygon| sink.on_polygon_change(polygon));
    drawing
        .handle(DrawEvent::Created(Box::new(shape)))
        .map_err(|e| errors::aoi_unreadable(&path, &e.to_string()))?;

    let metrics = orchestrator.view().polygon.as_ref().map(|polygon| {
        map.fly_to(fit_view(polygon));
        aoi_metrics(polygon)
    });
    if let Some(metrics) = &metrics {
        if !output.is_json() {
            output.section("Area of Interest");
            output.kv("Area", format!("{:.2} ha", metrics.area_hectares));
            output.kv(
                "Centroid",
                format!("{:.5}, {:.5}", metrics.centroid.lat, metrics.centroid.lng),
            );
        }
    }

    orchestrator.set_start_date(args.start);
    orchestrator.set_end_date(args.end);
    orchestrator.set_crop_type(args.crop_type);
    orchestrator.set_season(args.season);

    ensure_reachable(&api).await?;

    let spinner = spinner_for(output.is_json(), "Submitting analysis...");
    let job_id = match orchestrator.submit().await {
        Ok(job_id) => {
            finish_success(&spinner, &format!("Job {} submitted", job_id));
            job_id
        }
        Err(e) => {
            finish_error(&spinner, "Submission failed");
            return Err(e.into());
        }
    };

    if args.no_wait {
        if output.is_json() {
            output.result(serde_json::json!({ "job_id": job_id }))?;
        } else {
            output.info(format!("Check progress with: cropwatch status {} --watch", job_id));
        }
        return Ok(());
    }

    let spinner = spinner_for(output.is_json(), "Waiting for analysis...");
    let mut updates = orchestrator.subscribe();
    let progress = spinner.clone();
    let ticker = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let status = updates.borrow().as_ref().map(|job| job.status);
            if let Some(status) = status {
                progress.set_message(format!("Analysis {}...", status));
            }
        }
    });

    let result = orchestrator.wait_for_result().await;
    ticker.abort();

    let Some(job) = result else {
        finish_error(&spinner, "Polling stopped");
        anyhow::bail!("Polling stopped before job {} finished", job_id);
    };

    if let Some(failure) = job.failure() {
        finish_error(&spinner, "Analysis failed");
        return Err(failure.into());
    }
    finish_success(&spinner, "Analysis finished");

    if output.is_json() {
        output.result(AnalysisOutput { job, aoi: metrics })?;
    } else {
        report::print_job(&job, output)?;
    }

    Ok(())
}
