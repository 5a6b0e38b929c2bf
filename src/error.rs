use thiserror::Error;

/// Failure categories of a stats request.
///
/// Only [`StatsError::InvalidInput`], [`StatsError::Configuration`] and
/// [`StatsError::StatsUnavailable`] are ever returned by
/// [`StatsAggregator::get_stats`](crate::StatsAggregator::get_stats); the two
/// source variants stay inside the aggregator.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Configuration(String),

    #[error("GraphQL source failed: {0:#}")]
    PrimarySource(anyhow::Error),

    #[error("REST source failed: {0:#}")]
    SecondarySource(anyhow::Error),

    #[error("Failed to fetch GitHub data: {0}")]
    StatsUnavailable(String),
}

impl StatsError {
    /// Whether re-issuing the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PrimarySource(_) | Self::SecondarySource(_) | Self::StatsUnavailable(_)
        )
    }
}

/// Failures of the contact log.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Failed to store contact message: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Failed to prepare contact storage: {0}")]
    Io(#[from] std::io::Error),

    #[error("Contact storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_source_failures_are_retryable() {
        assert!(!StatsError::InvalidInput("x".into()).is_retryable());
        assert!(!StatsError::Configuration("x".into()).is_retryable());
        assert!(StatsError::StatsUnavailable("x".into()).is_retryable());
        assert!(StatsError::PrimarySource(anyhow::anyhow!("boom")).is_retryable());
    }

    #[test]
    fn unavailable_carries_underlying_message() {
        let err = StatsError::StatsUnavailable("HTTP 502".to_string());
        assert_eq!(err.to_string(), "Failed to fetch GitHub data: HTTP 502");
    }
}
