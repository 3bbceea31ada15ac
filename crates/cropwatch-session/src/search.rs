//! Debounced location search.
//!
//! Every keystroke bumps a revision counter. Suggestion requests carry the
//! revision that produced them and their response is applied only while that
//! revision is still current, so a slow reply for an old query can never
//! replace the list for a newer one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use cropwatch_core::config::SearchSettings;
use cropwatch_core::error::{CropwatchError, ErrorKind, Result};
use cropwatch_core::models::{MapView, SearchCandidate};
use cropwatch_core::ports::{Geocoder, MapSurface};

use crate::task::TaskGuard;

const SUGGESTIONS_FAILED: &str = "Location suggestions are unavailable right now";
const SEARCH_FAILED: &str = "Search failed. Please try again.";

/// Visible phase of the search box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Typing,
    AwaitingSuggestions,
    SuggestionsShown,
    Searching,
    ResultShown,
    Error,
}

/// Everything the search box needs to render
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchView {
    pub state: SearchState,
    pub query: String,
    pub suggestions: Vec<SearchCandidate>,
    pub highlighted: Option<usize>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    /// Confirmed selection, kept until the text is edited
    pub selection: Option<SearchCandidate>,
}

/// Debounced, cancel-safe location search bound to one map surface
#[derive(Clone)]
pub struct LocationSearch {
    shared: Arc<SearchShared>,
}

struct SearchShared {
    geocoder: Arc<dyn Geocoder>,
    map: Arc<dyn MapSurface>,
    settings: SearchSettings,
    inner: Mutex<SearchInner>,
}

#[derive(Default)]
struct SearchInner {
    view: SearchView,
    revision: u64,
    debounce: Option<TaskGuard>,
}

impl SearchInner {
    /// Invalidate every outstanding timer and request
    fn supersede(&mut self) -> u64 {
        self.revision += 1;
        self.debounce = None;
        self.revision
    }

    fn fail(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.view.state = SearchState::Error;
        self.view.suggestions.clear();
        self.view.highlighted = None;
        self.view.error = Some(message.into());
        self.view.error_kind = Some(kind);
    }
}

impl LocationSearch {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        map: Arc<dyn MapSurface>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            shared: Arc::new(SearchShared {
                geocoder,
                map,
                settings,
                inner: Mutex::new(SearchInner::default()),
            }),
        }
    }

    pub fn view(&self) -> SearchView {
        self.shared.lock().view.clone()
    }

    pub fn state(&self) -> SearchState {
        self.shared.lock().view.state
    }

    /// Replace the query text after a keystroke.
    ///
    /// Cancels the pending quiet-period timer and drops the confirmed
    /// selection. Queries long enough to search schedule one suggestion
    /// request after the quiet period. Emptying the field also cancels any
    /// map transition in progress.
    pub fn input(&self, text: impl Into<String>) {
        let text = text.into();
        let mut inner = self.shared.lock();
        let revision = inner.supersede();

        let view = &mut inner.view;
        view.query = text.clone();
        view.selection = None;
        view.error = None;
        view.error_kind = None;
        view.highlighted = None;

        let query = text.trim().to_string();
        if query.chars().count() < self.shared.settings.min_query_chars {
            view.suggestions.clear();
            if text.is_empty() {
                view.state = SearchState::Idle;
                drop(inner);
                self.shared.map.cancel_transition();
            } else {
                view.state = SearchState::Typing;
            }
            return;
        }
        view.state = SearchState::Typing;

        let weak = Arc::downgrade(&self.shared);
        let quiet = self.shared.settings.debounce;
        inner.debounce = Some(TaskGuard::spawn(async move {
            tokio::time::sleep(quiet).await;
            if let Some(shared) = weak.upgrade() {
                SearchShared::request_suggestions(&shared, revision, query);
            }
        }));
    }

    /// Pick suggestion `index` from the visible list
    pub fn select(&self, index: usize) -> Option<SearchCandidate> {
        let candidate = {
            let inner = self.shared.lock();
            if inner.view.state != SearchState::SuggestionsShown {
                return None;
            }
            inner.view.suggestions.get(index).cloned()?
        };
        self.shared.apply_selection(candidate.clone());
        Some(candidate)
    }

    pub fn highlight_next(&self) {
        let mut inner = self.shared.lock();
        let count = inner.view.suggestions.len();
        if count == 0 {
            return;
        }
        inner.view.highlighted = Some(match inner.view.highlighted {
            None => 0,
            Some(i) => (i + 1).min(count - 1),
        });
    }

    pub fn highlight_previous(&self) {
        let mut inner = self.shared.lock();
        if let Some(i) = inner.view.highlighted {
            inner.view.highlighted = Some(i.saturating_sub(1));
        }
    }

    /// Pick the highlighted suggestion, if any
    pub fn select_highlighted(&self) -> Option<SearchCandidate> {
        let index = self.shared.lock().view.highlighted?;
        self.select(index)
    }

    /// Submit the search form.
    ///
    /// A confirmed selection for unedited text is reused without a lookup.
    /// Otherwise the single best match is looked up and applied like a picked
    /// suggestion. Returns `Ok(None)` when the text was edited while the
    /// lookup was outstanding and the response was discarded.
    pub async fn submit(&self) -> Result<Option<SearchCandidate>> {
        let (revision, query) = {
            let mut inner = self.shared.lock();

            if let Some(selection) = inner.view.selection.clone() {
                drop(inner);
                tracing::debug!(place = %selection.label, "Reusing confirmed selection");
                self.shared.apply_selection(selection.clone());
                return Ok(Some(selection));
            }

            let query = inner.view.query.trim().to_string();
            if query.is_empty() {
                let err = CropwatchError::validation("query", "Enter a place to search for");
                inner.fail(err.kind(), err.to_string());
                return Err(err);
            }

            let revision = inner.supersede();
            inner.view.state = SearchState::Searching;
            inner.view.suggestions.clear();
            inner.view.highlighted = None;
            inner.view.error = None;
            inner.view.error_kind = None;
            (revision, query)
        };

        let result = self.shared.geocoder.lookup(&query, 1).await;

        let mut inner = self.shared.lock();
        if inner.revision != revision {
            tracing::debug!(query = %query, "Discarding superseded search result");
            return Ok(None);
        }

        match result {
            Ok(candidates) => match candidates.into_iter().next() {
                Some(best) => {
                    drop(inner);
                    self.shared.apply_selection(best.clone());
                    Ok(Some(best))
                }
                None => {
                    let err = CropwatchError::NoResults { query };
                    inner.fail(ErrorKind::NoResults, err.to_string());
                    Err(err)
                }
            },
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Location search failed");
                inner.fail(ErrorKind::Network, SEARCH_FAILED);
                Err(e)
            }
        }
    }

    /// Reset to idle, dropping suggestions, errors, the cached selection,
    /// and any map transition in progress
    pub fn clear(&self) {
        {
            let mut inner = self.shared.lock();
            inner.supersede();
            inner.view = SearchView::default();
        }
        self.shared.map.cancel_transition();
    }

    /// Collapse the suggestion list after a click outside the search box
    pub fn dismiss(&self) {
        let mut inner = self.shared.lock();
        if inner.view.state == SearchState::SuggestionsShown {
            inner.view.suggestions.clear();
            inner.view.highlighted = None;
            inner.view.state = SearchState::Typing;
        }
    }
}

impl SearchShared {
    fn lock(&self) -> MutexGuard<'_, SearchInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs when the quiet period elapses. The lookup itself is detached from
    /// the debounce guard; its response is filtered by revision instead.
    fn request_suggestions(shared: &Arc<Self>, revision: u64, query: String) {
        {
            let mut inner = shared.lock();
            if inner.revision != revision {
                return;
            }
            inner.view.state = SearchState::AwaitingSuggestions;
        }

        tracing::debug!(query = %query, revision, "Requesting suggestions");
        let geocoder = shared.geocoder.clone();
        let limit = shared.settings.suggestion_limit;
        let weak: Weak<Self> = Arc::downgrade(shared);

        tokio::spawn(async move {
            let result = geocoder.lookup(&query, limit).await;
            if let Some(shared) = weak.upgrade() {
                shared.apply_suggestions(revision, &query, result);
            }
        });
    }

    fn apply_suggestions(&self, revision: u64, query: &str, result: Result<Vec<SearchCandidate>>) {
        let mut inner = self.lock();
        if inner.revision != revision {
            tracing::debug!(query = %query, revision, "Discarding stale suggestions");
            return;
        }

        match result {
            Ok(candidates) => {
                inner.view.state = if candidates.is_empty() {
                    SearchState::Typing
                } else {
                    SearchState::SuggestionsShown
                };
                inner.view.suggestions = candidates;
                inner.view.highlighted = None;
            }
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Suggestion lookup failed");
                inner.fail(ErrorKind::Network, SUGGESTIONS_FAILED);
            }
        }
    }

    fn apply_selection(&self, candidate: SearchCandidate) {
        let view = MapView {
            center: candidate.coordinate,
            zoom: self.settings.zoom.for_kind(&candidate.kind),
        };

        {
            let mut inner = self.lock();
            inner.supersede();
            inner.view = SearchView {
                state: SearchState::ResultShown,
                query: candidate.short_label().to_string(),
                selection: Some(candidate),
                ..SearchView::default()
            };
        }

        self.map.fly_to(view);
    }
}
