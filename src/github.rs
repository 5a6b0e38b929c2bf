use crate::config::GithubConfig;
use crate::source::RichSource;
use crate::stats::{ContributionTotals, Language, RawRepository, RichProfile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const USER_ID_QUERY: &str = r#"
query($username: String!) {
    user(login: $username) {
        id
    }
}
"#;

const PROFILE_QUERY: &str = r#"
query($username: String!, $userId: ID!) {
    user(login: $username) {
        repositories(first: 100, ownerAffiliations: OWNER, orderBy: {field: UPDATED_AT, direction: DESC}) {
            totalCount
            nodes {
                name
                stargazerCount
                forkCount
                primaryLanguage {
                    name
                    color
                }
                pushedAt
                defaultBranchRef {
                    target {
                        ... on Commit {
                            history(author: {id: $userId}) {
                                totalCount
                            }
                        }
                    }
                }
            }
        }
        contributionsCollection {
            totalCommitContributions
            restrictedContributionsCount
        }
    }
}
"#;

#[derive(Deserialize)]
struct CountObj {
    #[serde(rename = "totalCount")]
    total_count: u64,
}

/// GitHub GraphQL client; the rich source.
#[derive(Clone)]
pub struct GithubClient {
    token: Option<Arc<String>>,
    http: Arc<Client>,
    endpoint: Arc<String>,
}

impl GithubClient {
    /// Create a GraphQL client from configuration. A missing token is not an
    /// error here; requests are refused later by the aggregator.
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            token: config.token.clone().map(Arc::new),
            http: Arc::new(http),
            endpoint: Arc::new(config.graphql_url.clone()),
        })
    }

    /// Low-level GraphQL request with status and `errors` checking.
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("GitHub token is not configured"))?;

        let resp = self
            .http
            .post(self.endpoint.as_str())
            .bearer_auth(token)
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Network error sending GraphQL request: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "GitHub GraphQL API error: {}",
                status.as_u16()
            ));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse JSON from GitHub: {e}"))?;

        // If GraphQL returned an `errors` field, treat it as an error.
        if let Some(errors) = json.get("errors") {
            return Err(anyhow::anyhow!("GraphQL reported errors: {errors:#}"));
        }

        Ok(json)
    }

    /// Resolve the node id of `username`; commit history is filtered by it.
    pub async fn user_id(&self, username: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct UserIdResponse {
            data: Option<UserIdData>,
        }
        #[derive(Deserialize)]
        struct UserIdData {
            user: Option<UserId>,
        }
        #[derive(Deserialize)]
        struct UserId {
            id: Option<String>,
        }

        let json = self
            .graphql(USER_ID_QUERY, serde_json::json!({ "username": username }))
            .await?;
        let parsed: UserIdResponse =
            serde_json::from_value(json).context("Failed to deserialize user_id response")?;

        parsed
            .data
            .and_then(|d| d.user)
            .and_then(|u| u.id)
            .ok_or_else(|| anyhow::anyhow!("User not found: {username}"))
    }

    /// Owned repositories with commit history counts, plus contribution totals.
    pub async fn profile(&self, username: &str, user_id: &str) -> Result<RichProfile> {
        #[derive(Deserialize)]
        struct ProfileResponse {
            data: Option<ProfileData>,
        }
        #[derive(Deserialize)]
        struct ProfileData {
            user: Option<ProfileUser>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ProfileUser {
            repositories: RepoConnection,
            contributions_collection: ContribCollection,
        }
        #[derive(Deserialize)]
        struct RepoConnection {
            #[serde(rename = "totalCount")]
            total_count: u64,
            nodes: Option<Vec<Option<RepoNode>>>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RepoNode {
            name: String,
            stargazer_count: u64,
            fork_count: u64,
            primary_language: Option<LanguageNode>,
            pushed_at: Option<DateTime<Utc>>,
            default_branch_ref: Option<BranchRef>,
        }
        #[derive(Deserialize)]
        struct LanguageNode {
            name: String,
            color: Option<String>,
        }
        #[derive(Deserialize)]
        struct BranchRef {
            target: Option<TargetCommit>,
        }
        #[derive(Deserialize)]
        struct TargetCommit {
            history: Option<CountObj>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ContribCollection {
            total_commit_contributions: u64,
            restricted_contributions_count: u64,
        }

        let json = self
            .graphql(
                PROFILE_QUERY,
                serde_json::json!({ "username": username, "userId": user_id }),
            )
            .await?;
        let parsed: ProfileResponse =
            serde_json::from_value(json).context("Failed to deserialize profile response")?;

        let user = parsed
            .data
            .and_then(|d| d.user)
            .ok_or_else(|| anyhow::anyhow!("User not found: {username}"))?;

        let repositories = user
            .repositories
            .nodes
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(|n| RawRepository {
                name: n.name,
                star_count: n.stargazer_count,
                fork_count: n.fork_count,
                primary_language: n.primary_language.map(|l| Language {
                    name: l.name,
                    color: l.color,
                }),
                last_pushed_at: n.pushed_at,
                commit_count: n
                    .default_branch_ref
                    .and_then(|b| b.target)
                    .and_then(|t| t.history)
                    .map(|h| h.total_count),
            })
            .collect();

        Ok(RichProfile {
            total_repos: user.repositories.total_count,
            repositories,
            contributions: ContributionTotals {
                total_commit_contributions: user.contributions_collection.total_commit_contributions,
                restricted_contributions_count: user
                    .contributions_collection
                    .restricted_contributions_count,
            },
        })
    }
}

#[async_trait]
impl RichSource for GithubClient {
    fn has_credentials(&self) -> bool {
        self.token.is_some()
    }

    async fn fetch_profile(&self, login: &str) -> Result<RichProfile> {
        // The history filter takes a node id, not a login, hence two round trips.
        let user_id = self.user_id(login).await?;
        debug!("Resolved {login} to node id {user_id}");
        self.profile(login, &user_id).await
    }
}
