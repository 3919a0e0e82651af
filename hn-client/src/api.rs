use crate::metrics::{MetricsCollector, RequestMetrics};
use chrono::{DateTime, TimeZone, Utc};
use gemscout_core::Config;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const DEFAULT_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";

/// Ranked id lists the API exposes. `New` is the only one the sweep
/// relies on; its newest-first ordering is what makes the early-exit
/// scan correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryCategory {
    New,
    Top,
    Best,
}

impl StoryCategory {
    fn endpoint(&self) -> &'static str {
        match self {
            StoryCategory::New => "newstories",
            StoryCategory::Top => "topstories",
            StoryCategory::Best => "beststories",
        }
    }
}

/// An item as the Firebase API returns it. Deleted/missing items come
/// back as JSON `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HnItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub by: Option<String>,
    pub time: Option<i64>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    pub score: Option<i64>,
    pub descendants: Option<i64>,
    pub deleted: Option<bool>,
    pub dead: Option<bool>,
}

impl HnItem {
    pub fn is_story(&self) -> bool {
        self.item_type.as_deref() == Some("story")
            && !self.deleted.unwrap_or(false)
            && !self.dead.unwrap_or(false)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.time.and_then(|t| Utc.timestamp_opt(t, 0).single())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HnUser {
    pub id: String,
    pub created: Option<i64>,
    pub karma: Option<i64>,
}

impl HnUser {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created.and_then(|t| Utc.timestamp_opt(t, 0).single())
    }
}

/// Read-only client for the Hacker News Firebase API.
///
/// Every network, timeout, or decoding failure is absorbed here and
/// reported as absence: callers treat a missing item as "skip this
/// one". Nothing is retried; an item missed this sweep is picked up by
/// the next one if it is still inside the live id window.
#[derive(Debug)]
pub struct HnClient {
    http_client: Client,
    base_url: String,
    metrics: Arc<MetricsCollector>,
}

impl HnClient {
    pub fn new(base_url: impl Into<String>, user_agent: &str, timeout: Duration) -> Self {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url: base_url.into(),
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.hn_api_base.clone(),
            &config.user_agent,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn default_client(user_agent: &str) -> Self {
        Self::new(DEFAULT_API_BASE, user_agent, Duration::from_secs(10))
    }

    /// Newest-first story ids, truncated to `limit`. An upstream failure
    /// yields an empty list, which ends the sweep without error.
    pub async fn list_recent_ids(&self, category: StoryCategory, limit: usize) -> Vec<i64> {
        let endpoint = format!("/{}.json", category.endpoint());
        match self.fetch_json::<Vec<i64>>(&endpoint).await {
            Some(mut ids) => {
                ids.truncate(limit);
                debug!("Retrieved {} {} ids", ids.len(), category.endpoint());
                ids
            }
            None => Vec::new(),
        }
    }

    /// Item detail by id. `None` covers deleted items, missing items,
    /// and any transport or decode failure alike.
    pub async fn get_item(&self, id: i64) -> Option<HnItem> {
        let endpoint = format!("/item/{}.json", id);
        let item = self.fetch_json::<Option<HnItem>>(&endpoint).await.flatten();
        if item.is_none() {
            debug!("Item {} not found or deleted", id);
            self.metrics.record_absent().await;
        }
        item
    }

    /// User profile by name, absent on any failure.
    pub async fn get_user(&self, username: &str) -> Option<HnUser> {
        let endpoint = format!("/user/{}.json", username);
        let user = self.fetch_json::<Option<HnUser>>(&endpoint).await.flatten();
        if user.is_none() {
            debug!("User {} not found", username);
            self.metrics.record_absent().await;
        }
        user
    }

    pub async fn metrics(&self) -> crate::metrics::ApiMetrics {
        self.metrics.snapshot().await
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Option<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        let start_time = Instant::now();

        let result = match self.http_client.get(&url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    match response.json::<T>().await {
                        Ok(value) => Ok(value),
                        Err(e) => {
                            warn!("Failed to decode response for {}: {}", endpoint, e);
                            Err("decode_error")
                        }
                    }
                } else {
                    warn!("Request failed with status {} for {}", status, endpoint);
                    Err("http_error")
                }
            }
            Err(e) if e.is_timeout() => {
                warn!("Request timeout for {}", endpoint);
                Err("timeout")
            }
            Err(e) => {
                warn!("Network error for {}: {}", endpoint, e);
                Err("network_error")
            }
        };

        let request_metrics = RequestMetrics {
            endpoint: endpoint.to_string(),
            response_time: start_time.elapsed(),
            success: result.is_ok(),
            error_type: result.as_ref().err().map(|e| e.to_string()),
        };
        self.metrics.record_request(request_metrics).await;

        result.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_category_endpoints() {
        assert_eq!(StoryCategory::New.endpoint(), "newstories");
        assert_eq!(StoryCategory::Top.endpoint(), "topstories");
        assert_eq!(StoryCategory::Best.endpoint(), "beststories");
    }

    #[test]
    fn item_deserializes_with_missing_fields() {
        let item: HnItem = serde_json::from_str(r#"{"id": 1, "type": "story"}"#).unwrap();
        assert_eq!(item.id, 1);
        assert!(item.is_story());
        assert!(item.title.is_none());
        assert!(item.created_at().is_none());
    }

    #[test]
    fn deleted_and_dead_items_are_not_stories() {
        let deleted: HnItem =
            serde_json::from_str(r#"{"id": 2, "type": "story", "deleted": true}"#).unwrap();
        assert!(!deleted.is_story());

        let dead: HnItem =
            serde_json::from_str(r#"{"id": 3, "type": "story", "dead": true}"#).unwrap();
        assert!(!dead.is_story());

        let comment: HnItem = serde_json::from_str(r#"{"id": 4, "type": "comment"}"#).unwrap();
        assert!(!comment.is_story());
    }

    #[test]
    fn item_time_converts_to_utc() {
        let item: HnItem =
            serde_json::from_str(r#"{"id": 5, "type": "story", "time": 1640995200}"#).unwrap();
        let created = item.created_at().unwrap();
        assert_eq!(created.timestamp(), 1640995200);
    }

    #[tokio::test]
    async fn client_starts_with_empty_metrics() {
        let client = HnClient::default_client("gemscout-test/0.1");
        let metrics = client.metrics().await;
        assert_eq!(metrics.total_requests, 0);
        assert_eq!(metrics.absent_items, 0);
    }
}
