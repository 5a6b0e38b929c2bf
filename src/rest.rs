//! GitHub REST client; the simple source used as a fallback.

use crate::config::GithubConfig;
use crate::source::SimpleSource;
use crate::stats::{Language, RawRepository};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const V3_JSON: &str = "application/vnd.github.v3+json";
const COMMIT_SEARCH_PREVIEW: &str = "application/vnd.github.cloak-preview";

#[derive(Debug, Deserialize)]
struct UserProfile {
    public_repos: u64,
}

#[derive(Debug, Deserialize)]
struct Repository {
    name: String,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    language: Option<String>,
    pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct CommitSearch {
    total_count: u64,
}

#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: Url,
}

impl RestClient {
    /// The token is optional here; unauthenticated calls are rate-limited harder
    /// but still work.
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(V3_JSON));

        if let Some(t) = &config.token {
            let mut auth_val = HeaderValue::from_str(&format!("token {t}"))
                .context("GitHub token is not a valid header value")?;
            auth_val.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_val);
        }

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = Url::parse(&config.rest_url)
            .with_context(|| format!("Invalid REST base URL: {}", config.rest_url))?;

        Ok(Self { http, base_url })
    }

    /// `base_url` joined with `segments`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("REST base URL cannot take a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        accept: Option<&'static str>,
        what: &str,
    ) -> Result<T> {
        let mut req = self.http.get(url);
        if let Some(accept) = accept {
            req = req.header(ACCEPT, accept);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Network error fetching {what}: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "GitHub REST API returned HTTP {} for {what}",
                status.as_u16()
            ));
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to deserialize {what} response"))
    }
}

#[async_trait]
impl SimpleSource for RestClient {
    async fn fetch_public_repo_count(&self, login: &str) -> Result<u64> {
        let url = self.endpoint(&["users", login])?;
        let profile: UserProfile = self.get_json(url, None, "user profile").await?;
        Ok(profile.public_repos)
    }

    async fn fetch_repositories(&self, login: &str) -> Result<Vec<RawRepository>> {
        let mut url = self.endpoint(&["users", login, "repos"])?;
        url.query_pairs_mut()
            .append_pair("per_page", "100")
            .append_pair("sort", "updated");

        let repos: Vec<Repository> = self.get_json(url, None, "repository list").await?;

        Ok(repos
            .into_iter()
            .map(|r| RawRepository {
                name: r.name,
                star_count: r.stargazers_count,
                fork_count: r.forks_count,
                primary_language: r.language.map(|name| Language { name, color: None }),
                last_pushed_at: r.pushed_at,
                commit_count: None,
            })
            .collect())
    }

    async fn count_commits(&self, login: &str) -> Result<u64> {
        let mut url = self.endpoint(&["search", "commits"])?;
        url.query_pairs_mut()
            .append_pair("q", &format!("author:{login}"))
            .append_pair("per_page", "1");

        let search: CommitSearch = self
            .get_json(url, Some(COMMIT_SEARCH_PREVIEW), "commit search")
            .await?;
        Ok(search.total_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> RestClient {
        let config = GithubConfig {
            rest_url: base.to_string(),
            ..GithubConfig::default()
        };
        RestClient::new(&config).unwrap()
    }

    #[test]
    fn endpoint_encodes_segments() {
        let c = client("https://api.github.com");
        let url = c.endpoint(&["users", "a/b?c", "repos"]).unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/users/a%2Fb%3Fc/repos");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let c = client("http://localhost:8080/github/");
        let url = c.endpoint(&["users", "octocat"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/github/users/octocat");
    }

    #[test]
    fn repository_tolerates_missing_fields() {
        let json = r#"{ "name": "dotfiles", "language": null, "pushed_at": null }"#;
        let repo: Repository = serde_json::from_str(json).unwrap();
        assert_eq!(repo.name, "dotfiles");
        assert_eq!(repo.stargazers_count, 0);
        assert!(repo.language.is_none());
        assert!(repo.pushed_at.is_none());
    }

    #[test]
    fn repository_parses_push_time() {
        let json = r#"{
            "name": "portfolio",
            "stargazers_count": 12,
            "forks_count": 3,
            "language": "TypeScript",
            "pushed_at": "2025-05-30T10:00:00Z"
        }"#;
        let repo: Repository = serde_json::from_str(json).unwrap();
        assert_eq!(repo.stargazers_count, 12);
        assert_eq!(repo.language.as_deref(), Some("TypeScript"));
        assert_eq!(repo.pushed_at.unwrap().to_rfc3339(), "2025-05-30T10:00:00+00:00");
    }
}
