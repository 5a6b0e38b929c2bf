//! Seams between the aggregator and the data sources it queries.

use crate::stats::{RawRepository, RichProfile};
use anyhow::Result;
use async_trait::async_trait;

/// Source with per-repository commit history and contribution totals.
#[async_trait]
pub trait RichSource: Send + Sync {
    /// Whether the credentials this source requires are present.
    fn has_credentials(&self) -> bool;

    /// Up to 100 owned repositories, most recently updated first, plus
    /// contribution totals for `login`.
    async fn fetch_profile(&self, login: &str) -> Result<RichProfile>;
}

/// Lower-fidelity source used when the rich one is unavailable.
#[async_trait]
pub trait SimpleSource: Send + Sync {
    async fn fetch_public_repo_count(&self, login: &str) -> Result<u64>;

    /// Up to 100 repositories; the order is not relied upon.
    async fn fetch_repositories(&self, login: &str) -> Result<Vec<RawRepository>>;

    /// Best-effort count of commits authored by `login`.
    async fn count_commits(&self, login: &str) -> Result<u64>;
}
