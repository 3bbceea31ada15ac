use anyhow::Result;
use cropwatch_core::models::SearchCandidate;
use cropwatch_session::{LocationSearch, SearchState};
use dialoguer::Select;
use std::time::Duration;

const SETTLE_POLL: Duration = Duration::from_millis(25);
const SUGGESTION_TIMEOUT: Duration = Duration::from_secs(15);

/// Type `query` into the search box and wait for its suggestions
pub async fn suggestions_for(
    search: &LocationSearch,
    query: &str,
    quiet_period: Duration,
) -> Vec<SearchCandidate> {
    search.input(query);
    tokio::time::sleep(quiet_period + SETTLE_POLL).await;

    let waited = tokio::time::timeout(SUGGESTION_TIMEOUT, async {
        while search.state() == SearchState::AwaitingSuggestions {
            tokio::time::sleep(SETTLE_POLL).await;
        }
    })
    .await;
    if waited.is_err() {
        tracing::warn!(query = %query, "Timed out waiting for suggestions");
    }

    search.view().suggestions
}

/// Let the user pick one suggestion; `None` when they cancel
pub fn pick_suggestion(suggestions: &[SearchCandidate]) -> Result<Option<usize>> {
    let labels: Vec<&str> = suggestions.iter().map(|s| s.label.as_str()).collect();
    let picked = Select::new()
        .with_prompt("Select a location")
        .items(&labels)
        .default(0)
        .interact_opt()?;
    Ok(picked)
}
