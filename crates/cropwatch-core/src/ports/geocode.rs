use async_trait::async_trait;

use crate::error::Result;
use crate::models::SearchCandidate;

/// Port for free-text location lookup
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up at most `limit` candidates for `query`, best match first
    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<SearchCandidate>>;
}
