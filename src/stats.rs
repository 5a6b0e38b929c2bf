use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Primary language of a repository as reported by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub name: String,
    /// Only the GraphQL source reports a color.
    pub color: Option<String>,
}

/// One repository as fetched from either source, before aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRepository {
    pub name: String,
    pub star_count: u64,
    pub fork_count: u64,
    pub primary_language: Option<Language>,
    pub last_pushed_at: Option<DateTime<Utc>>,
    /// Commits authored by the account on the default branch (GraphQL only).
    pub commit_count: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContributionTotals {
    pub total_commit_contributions: u64,
    pub restricted_contributions_count: u64,
}

impl ContributionTotals {
    pub fn sum(&self) -> u64 {
        self.total_commit_contributions
            .saturating_add(self.restricted_contributions_count)
    }
}

/// Everything the rich source returns for one account.
#[derive(Debug, Clone, Default)]
pub struct RichProfile {
    pub total_repos: u64,
    pub repositories: Vec<RawRepository>,
    pub contributions: ContributionTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub name: String,
    pub percentage: u8,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Push,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub repo: String,
    pub date: String,
}

/// Normalized statistics handed back to callers, whichever source produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_repos: u64,
    pub total_stars: u64,
    pub total_forks: u64,
    pub total_commits: u64,
    pub languages: Vec<LanguageShare>,
    pub recent_activity: Vec<ActivityEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serializes_in_camel_case() {
        let summary = StatsSummary {
            total_repos: 3,
            total_stars: 10,
            total_forks: 2,
            total_commits: 40,
            languages: vec![LanguageShare {
                name: "Rust".to_string(),
                percentage: 100,
                color: "#dea584".to_string(),
            }],
            recent_activity: vec![ActivityEntry {
                kind: ActivityKind::Push,
                repo: "portfolio".to_string(),
                date: "2 hours ago".to_string(),
            }],
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["totalRepos"], 3);
        assert_eq!(json["totalCommits"], 40);
        assert_eq!(json["languages"][0]["percentage"], 100);
        assert_eq!(json["recentActivity"][0]["type"], "push");
        assert_eq!(json["recentActivity"][0]["date"], "2 hours ago");
    }

    #[test]
    fn contribution_sum_saturates() {
        let totals = ContributionTotals {
            total_commit_contributions: u64::MAX,
            restricted_contributions_count: 1,
        };
        assert_eq!(totals.sum(), u64::MAX);
    }
}
