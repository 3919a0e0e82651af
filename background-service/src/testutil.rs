use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use hn_client::{HnItem, HnUser, ItemSource, StoryCategory};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixture source: a frozen id window plus canned items and users.
/// Counts `get_item` calls so tests can assert the early-exit scan
/// stops issuing fetches.
#[derive(Default)]
pub(crate) struct StubSource {
    pub ids: Vec<i64>,
    pub items: HashMap<i64, HnItem>,
    pub users: HashMap<String, HnUser>,
    pub item_calls: AtomicUsize,
    pub item_delay: Option<std::time::Duration>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_story(
        &mut self,
        id: i64,
        title: &str,
        author: &str,
        minutes_ago: i64,
        url: Option<&str>,
    ) {
        self.push_story_with(id, title, author, minutes_ago, url, None);
    }

    pub fn push_story_with(
        &mut self,
        id: i64,
        title: &str,
        author: &str,
        minutes_ago: i64,
        url: Option<&str>,
        text: Option<&str>,
    ) {
        let created = Utc::now() - Duration::minutes(minutes_ago);
        let item = HnItem {
            id,
            item_type: Some("story".to_string()),
            by: Some(author.to_string()),
            time: Some(created.timestamp()),
            title: Some(title.to_string()),
            url: url.map(|u| u.to_string()),
            text: text.map(|t| t.to_string()),
            score: Some(1),
            descendants: Some(0),
            deleted: None,
            dead: None,
        };
        self.ids.push(id);
        self.items.insert(id, item);
    }

    pub fn push_user(&mut self, name: &str, karma: i64, created: Option<DateTime<Utc>>) {
        self.users.insert(
            name.to_string(),
            HnUser {
                id: name.to_string(),
                created: created.map(|c| c.timestamp()),
                karma: Some(karma),
            },
        );
    }

}

#[async_trait]
impl ItemSource for StubSource {
    async fn list_recent_ids(&self, _category: StoryCategory, limit: usize) -> Vec<i64> {
        self.ids.iter().copied().take(limit).collect()
    }

    async fn get_item(&self, id: i64) -> Option<HnItem> {
        self.item_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.item_delay {
            tokio::time::sleep(delay).await;
        }
        self.items.get(&id).cloned()
    }

    async fn get_user(&self, username: &str) -> Option<HnUser> {
        self.users.get(username).cloned()
    }
}
