//! Debounced location search behavior

use std::sync::Arc;
use std::time::Duration;

use cropwatch_client::MemoryGeocoder;
use cropwatch_core::config::SearchSettings;
use cropwatch_core::models::{LngLat, PlaceKind, SearchCandidate};
use cropwatch_core::ErrorKind;
use cropwatch_session::{HeadlessMap, LocationSearch, SearchState};

fn gazetteer() -> Vec<SearchCandidate> {
    vec![
        SearchCandidate::new("Indonesia", LngLat::new(117.89, -2.48), PlaceKind::Country),
        SearchCandidate::new("West Java, Java, Indonesia", LngLat::new(107.6, -7.09), PlaceKind::State),
        SearchCandidate::new("Bandung, West Java, Java, Indonesia", LngLat::new(107.61, -6.92), PlaceKind::Locality),
        SearchCandidate::new("Bandung Barat, West Java, Indonesia", LngLat::new(107.41, -6.84), PlaceKind::Region),
        SearchCandidate::new("Bantul, Yogyakarta, Indonesia", LngLat::new(110.33, -7.89), PlaceKind::Region),
    ]
}

fn setup() -> (Arc<MemoryGeocoder>, Arc<HeadlessMap>, LocationSearch) {
    let geocoder = Arc::new(MemoryGeocoder::new(gazetteer()));
    let map = Arc::new(HeadlessMap::new());
    let search = LocationSearch::new(geocoder.clone(), map.clone(), SearchSettings::default());
    (geocoder, map, search)
}

async fn quiet_period() {
    tokio::time::sleep(Duration::from_millis(400)).await;
}

#[tokio::test(start_paused = true)]
async fn test_short_queries_never_reach_geocoder() {
    let (geocoder, _map, search) = setup();

    search.input("b");
    search.input("ba");
    search.input("  ba  ");
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(geocoder.call_count(), 0);
    let view = search.view();
    assert!(view.suggestions.is_empty());
    assert_eq!(view.state, SearchState::Typing);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_typing_issues_one_request() {
    let (geocoder, _map, search) = setup();

    for prefix in ["b", "ba", "ban", "band", "bandu", "bandung"] {
        search.input(prefix);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    quiet_period().await;

    assert_eq!(geocoder.calls(), vec!["bandung".to_string()]);
    let view = search.view();
    assert_eq!(view.state, SearchState::SuggestionsShown);
    assert_eq!(view.suggestions.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_late_response_for_old_query_is_discarded() {
    let (geocoder, _map, search) = setup();
    geocoder.delay_query("ban", Duration::from_secs(2));

    search.input("ban");
    quiet_period().await;
    assert_eq!(search.state(), SearchState::AwaitingSuggestions);

    search.input("bant");
    quiet_period().await;
    let labels: Vec<String> = search.view().suggestions.into_iter().map(|s| s.label).collect();
    assert_eq!(labels, vec!["Bantul, Yogyakarta, Indonesia".to_string()]);

    // "ban" resolves now, after "bant" already updated the list
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(geocoder.calls(), vec!["ban".to_string(), "bant".to_string()]);
    let labels: Vec<String> = search.view().suggestions.into_iter().map(|s| s.label).collect();
    assert_eq!(labels, vec!["Bantul, Yogyakarta, Indonesia".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_selection_shortens_label_and_flies_to_place() {
    let (_geocoder, map, search) = setup();

    search.input("bandung");
    quiet_period().await;
    let picked = search.select(0).unwrap();

    let view = search.view();
    assert_eq!(view.state, SearchState::ResultShown);
    assert_eq!(view.query, "Bandung");
    assert!(view.suggestions.is_empty());
    assert_eq!(view.selection, Some(picked.clone()));

    let target = map.view().unwrap();
    assert_eq!(target.center, picked.coordinate);
    assert_eq!(target.zoom, 13);
}

#[tokio::test(start_paused = true)]
async fn test_country_zooms_coarser_than_locality() {
    let (_geocoder, map, search) = setup();

    search.input("indonesia");
    quiet_period().await;
    let country = search.view().suggestions.iter().position(|s| s.kind == PlaceKind::Country);
    search.select(country.unwrap()).unwrap();
    let country_zoom = map.view().unwrap().zoom;

    search.input("bandung, west");
    quiet_period().await;
    search.select(0).unwrap();
    let locality_zoom = map.view().unwrap().zoom;

    assert!(country_zoom < locality_zoom);
}

#[tokio::test(start_paused = true)]
async fn test_submit_after_selection_reuses_cache() {
    let (geocoder, map, search) = setup();

    search.input("bandung");
    quiet_period().await;
    search.select(0).unwrap();
    let calls_before = geocoder.call_count();

    let result = search.submit().await.unwrap();

    assert_eq!(geocoder.call_count(), calls_before);
    assert_eq!(result.unwrap().short_label(), "Bandung");
    assert_eq!(map.transitions().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_editing_invalidates_cached_selection() {
    let (geocoder, _map, search) = setup();

    search.input("bandung");
    quiet_period().await;
    search.select(0).unwrap();

    search.input("Bantul");
    assert!(search.view().selection.is_none());

    let found = search.submit().await.unwrap().unwrap();
    assert_eq!(found.short_label(), "Bantul");
    assert_eq!(geocoder.calls().last().map(String::as_str), Some("Bantul"));
}

#[tokio::test(start_paused = true)]
async fn test_submit_without_matches_is_no_results() {
    let (_geocoder, _map, search) = setup();

    search.input("atlantis");
    let err = search.submit().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoResults);
    let view = search.view();
    assert_eq!(view.state, SearchState::Error);
    assert_eq!(view.error_kind, Some(ErrorKind::NoResults));
    assert!(view.error.unwrap().contains("atlantis"));
}

#[tokio::test(start_paused = true)]
async fn test_network_failure_is_distinct_error() {
    let (geocoder, _map, search) = setup();
    geocoder.set_failing(true);

    search.input("bandung");
    let err = search.submit().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    let view = search.view();
    assert_eq!(view.state, SearchState::Error);
    assert_eq!(view.error_kind, Some(ErrorKind::Network));
}

#[tokio::test(start_paused = true)]
async fn test_clear_resets_everything() {
    let (geocoder, map, search) = setup();

    search.input("bandung");
    quiet_period().await;
    search.select(0).unwrap();
    search.input("band");
    search.clear();
    quiet_period().await;

    assert_eq!(search.view(), Default::default());
    assert_eq!(search.state(), SearchState::Idle);
    assert_eq!(map.cancelled_transitions(), 1);
    // Pending debounce for "band" was cancelled
    assert_eq!(geocoder.calls(), vec!["bandung".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_erasing_text_cancels_map_transition() {
    let (_geocoder, map, search) = setup();

    search.input("bandung");
    quiet_period().await;
    search.select(0).unwrap();

    search.input("Bandun");
    assert_eq!(map.cancelled_transitions(), 0);
    search.input("");

    assert_eq!(search.state(), SearchState::Idle);
    assert!(search.view().selection.is_none());
    assert_eq!(map.cancelled_transitions(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_keeps_text() {
    let (_geocoder, _map, search) = setup();

    search.input("bandung");
    quiet_period().await;
    search.dismiss();

    let view = search.view();
    assert!(view.suggestions.is_empty());
    assert_eq!(view.query, "bandung");
    assert_eq!(view.state, SearchState::Typing);
}

#[tokio::test(start_paused = true)]
async fn test_keyboard_highlight_and_select() {
    let (_geocoder, _map, search) = setup();

    search.input("bandung");
    quiet_period().await;
    search.highlight_next();
    search.highlight_next();
    search.highlight_next();
    assert_eq!(search.view().highlighted, Some(1));
    search.highlight_previous();

    let picked = search.select_highlighted().unwrap();
    assert_eq!(picked.short_label(), "Bandung");
}
