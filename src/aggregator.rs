use crate::aggregate::{summarize_rich, summarize_simple};
use crate::config::{Config, TOKEN_ENV_VAR};
use crate::error::StatsError;
use crate::github::GithubClient;
use crate::rest::RestClient;
use crate::source::{RichSource, SimpleSource};
use crate::stats::StatsSummary;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Produces a [`StatsSummary`] for an account, preferring the rich source and
/// downgrading to the simple one at most once per call.
///
/// Holds no per-request state; clone it or share it behind an `Arc`.
#[derive(Clone)]
pub struct StatsAggregator {
    rich: Arc<dyn RichSource>,
    simple: Arc<dyn SimpleSource>,
}

impl StatsAggregator {
    pub fn new(rich: Arc<dyn RichSource>, simple: Arc<dyn SimpleSource>) -> Self {
        Self { rich, simple }
    }

    /// Aggregator talking to the GitHub GraphQL and REST APIs.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Arc::new(GithubClient::new(&config.github)?),
            Arc::new(RestClient::new(&config.github)?),
        ))
    }

    pub async fn get_stats(&self, identity: &str) -> Result<StatsSummary, StatsError> {
        let login = identity.trim();
        if login.is_empty() {
            return Err(StatsError::InvalidInput(
                "Username parameter is required".to_string(),
            ));
        }

        if !self.rich.has_credentials() {
            return Err(StatsError::Configuration(format!(
                "GitHub token is required for accurate commit counts (set {TOKEN_ENV_VAR})"
            )));
        }

        match self.try_primary(login).await {
            Ok(summary) => {
                info!("Fetched stats for {login} from GraphQL");
                return Ok(summary);
            }
            Err(e) => warn!("{e}; falling back to REST for {login}"),
        }

        match self.try_secondary(login).await {
            Ok(summary) => {
                info!("Fetched stats for {login} from REST fallback");
                Ok(summary)
            }
            Err(e) => {
                error!("REST fallback also failed for {login}: {e}");
                let message = match e {
                    StatsError::SecondarySource(inner) => format!("{inner:#}"),
                    other => other.to_string(),
                };
                Err(StatsError::StatsUnavailable(message))
            }
        }
    }

    async fn try_primary(&self, login: &str) -> Result<StatsSummary, StatsError> {
        let profile = self
            .rich
            .fetch_profile(login)
            .await
            .map_err(StatsError::PrimarySource)?;
        Ok(summarize_rich(&profile, Utc::now()))
    }

    async fn try_secondary(&self, login: &str) -> Result<StatsSummary, StatsError> {
        let (public_repos, repos) = tokio::try_join!(
            self.simple.fetch_public_repo_count(login),
            self.simple.fetch_repositories(login),
        )
        .map_err(StatsError::SecondarySource)?;

        let commits = match self.simple.count_commits(login).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(
                    "Commit search failed for {login}, estimating from {} repositories: {e:#}",
                    repos.len()
                );
                None
            }
        };

        Ok(summarize_simple(public_repos, &repos, commits, Utc::now()))
    }
}
