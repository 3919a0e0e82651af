use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const GITHUB_API_BASE: &str = "https://api.github.com";

/// External repository-quality signal for posts that link to a code
/// host. Absent (`None`) whenever the host cannot be asked; the scorer
/// treats that as a zero contribution, never an error.
#[async_trait]
pub trait RepoSignalSource: Send + Sync {
    async fn repo_quality(&self, url: &str) -> Option<f64>;
}

#[derive(Debug, Clone, Deserialize)]
struct GithubRepo {
    #[serde(default)]
    stargazers_count: i64,
    updated_at: Option<String>,
    description: Option<String>,
    license: Option<serde_json::Value>,
    #[serde(default)]
    open_issues_count: i64,
}

/// Scores a GitHub repository from its public API metadata: stars,
/// recent activity, description, language diversity, license, open
/// issues. Each factor is a small additive bonus, clamped to 1.0.
#[derive(Debug)]
pub struct GithubRepoSignal {
    http_client: Client,
    base_url: String,
}

impl GithubRepoSignal {
    pub fn new(user_agent: &str) -> Self {
        Self::with_base_url(GITHUB_API_BASE, user_agent)
    }

    pub fn with_base_url(base_url: impl Into<String>, user_agent: &str) -> Self {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    /// `https://github.com/owner/repo/...` -> `(owner, repo)`.
    fn parse_repo_path(url: &str) -> Option<(String, String)> {
        let parsed = url::Url::parse(url).ok()?;
        if parsed.host_str()? != "github.com" {
            return None;
        }
        let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
        let owner = segments.next()?.to_string();
        let repo = segments.next()?.to_string();
        Some((owner, repo))
    }

    async fn score_repo(&self, owner: &str, repo: &str) -> Option<f64> {
        let repo_url = format!("{}/repos/{}/{}", self.base_url, owner, repo);
        let response = self.http_client.get(&repo_url).send().await.ok()?;
        if !response.status().is_success() {
            debug!("GitHub API returned {} for {}/{}", response.status(), owner, repo);
            return None;
        }
        let data: GithubRepo = response.json().await.ok()?;

        let mut score: f64 = 0.0;

        if data.stargazers_count > 0 {
            score += (data.stargazers_count as f64 / 100.0 * 0.1).min(0.3);
        }

        if let Some(days) = self.days_since_update(&data) {
            if days < 30 {
                score += 0.2;
            } else if days < 90 {
                score += 0.1;
            }
        }

        if data.description.as_deref().is_some_and(|d| !d.is_empty()) {
            score += 0.1;
        }
        if data.license.is_some() {
            score += 0.1;
        }
        if data.open_issues_count > 0 {
            score += 0.1;
        }

        // Language diversity is a separate endpoint; a failure there
        // just skips the bonus.
        let languages_url = format!("{}/repos/{}/{}/languages", self.base_url, owner, repo);
        if let Ok(response) = self.http_client.get(&languages_url).send().await {
            if response.status().is_success() {
                if let Ok(languages) = response.json::<HashMap<String, u64>>().await {
                    if languages.len() > 1 {
                        score += 0.1;
                    }
                }
            }
        }

        Some(score.min(1.0))
    }

    fn days_since_update(&self, data: &GithubRepo) -> Option<i64> {
        let updated = data.updated_at.as_deref()?;
        let updated = DateTime::parse_from_rfc3339(updated).ok()?;
        Some((Utc::now() - updated.with_timezone(&Utc)).num_days())
    }
}

#[async_trait]
impl RepoSignalSource for GithubRepoSignal {
    async fn repo_quality(&self, url: &str) -> Option<f64> {
        let (owner, repo) = Self::parse_repo_path(url)?;
        self.score_repo(&owner, &repo).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_repo_from_url() {
        assert_eq!(
            GithubRepoSignal::parse_repo_path("https://github.com/rust-lang/rust"),
            Some(("rust-lang".to_string(), "rust".to_string()))
        );
        assert_eq!(
            GithubRepoSignal::parse_repo_path("https://github.com/owner/repo/tree/main/src"),
            Some(("owner".to_string(), "repo".to_string()))
        );
    }

    #[test]
    fn rejects_non_repo_urls() {
        assert_eq!(GithubRepoSignal::parse_repo_path("https://github.com/"), None);
        assert_eq!(
            GithubRepoSignal::parse_repo_path("https://github.com/just-owner"),
            None
        );
        assert_eq!(
            GithubRepoSignal::parse_repo_path("https://example.com/owner/repo"),
            None
        );
        assert_eq!(GithubRepoSignal::parse_repo_path("not a url"), None);
    }
}
