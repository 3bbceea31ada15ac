//! Search command implementation

use std::sync::Arc;

use crate::cli::SearchArgs;
use crate::interactive::{pick_suggestion, suggestions_for};
use crate::output::OutputWriter;
use crate::output_types::SearchOutput;
use crate::progress::{finish_success, spinner_for};
use anyhow::Result;
use cropwatch_client::NominatimGeocoder;
use cropwatch_core::config::LayeredConfig;
use cropwatch_core::models::SearchCandidate;
use cropwatch_core::ports::MapSurface;
use cropwatch_session::{HeadlessMap, LocationSearch};

pub async fn execute(args: SearchArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let settings = config.search_settings();
    let geocoder = Arc::new(NominatimGeocoder::new(config.geocode_endpoint.value.clone())?);
    let map = Arc::new(HeadlessMap::new());
    map.set_base_layer(&config.tile_url.value);
    let search = LocationSearch::new(geocoder, map.clone(), settings.clone());

    let place = if args.interactive && !output.is_json() {
        let spinner = spinner_for(output.is_json(), "Looking up suggestions...");
        let suggestions = suggestions_for(&search, &args.query, settings.debounce).await;
        spinner.finish_and_clear();

        if suggestions.is_empty() {
            output.info("No suggestions, searching for the best match");
            best_match(&search, output).await?
        } else {
            match pick_suggestion(&suggestions)? {
                Some(index) => match search.select(index) {
                    Some(place) => place,
                    None => anyhow::bail!("Suggestion {} is no longer available", index),
                },
                None => {
                    output.info("Search cancelled");
                    return Ok(());
                }
            }
        }
    } else {
        search.input(args.query.as_str());
        best_match(&search, output).await?
    };

    let view = map.view();
    if output.is_json() {
        output.result(SearchOutput {
            query: args.query,
            short_label: place.short_label().to_string(),
            place,
            view,
        })?;
    } else {
        output.section("Location");
        output.kv("Name", &place.label);
        output.kv("Short label", place.short_label());
        output.kv("Kind", format!("{:?}", place.kind));
        output.kv("Coordinates", format!("{:.5}, {:.5}", place.coordinate.lat, place.coordinate.lng));
        if let Some(view) = view {
            output.kv("Map zoom", view.zoom);
        }
    }

    Ok(())
}

async fn best_match(search: &LocationSearch, output: &OutputWriter) -> Result<SearchCandidate> {
    let spinner = spinner_for(output.is_json(), "Searching...");
    match search.submit().await {
        Ok(Some(place)) => {
            finish_success(&spinner, "Found");
            Ok(place)
        }
        Ok(None) => {
            spinner.finish_and_clear();
            anyhow::bail!("Search was superseded")
        }
        Err(e) => {
            spinner.finish_and_clear();
            Err(e.into())
        }
    }
}
