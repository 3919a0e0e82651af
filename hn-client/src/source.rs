use crate::api::{HnClient, HnItem, HnUser, StoryCategory};
use async_trait::async_trait;

/// Seam between the ingestion jobs and the live API. The sweep and the
/// success monitor only ever see this trait, so tests drive them with
/// fixture sources.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Newest-first id list. Callers depend on the ordering.
    async fn list_recent_ids(&self, category: StoryCategory, limit: usize) -> Vec<i64>;

    async fn get_item(&self, id: i64) -> Option<HnItem>;

    async fn get_user(&self, username: &str) -> Option<HnUser>;
}

#[async_trait]
impl ItemSource for HnClient {
    async fn list_recent_ids(&self, category: StoryCategory, limit: usize) -> Vec<i64> {
        HnClient::list_recent_ids(self, category, limit).await
    }

    async fn get_item(&self, id: i64) -> Option<HnItem> {
        HnClient::get_item(self, id).await
    }

    async fn get_user(&self, username: &str) -> Option<HnUser> {
        HnClient::get_user(self, username).await
    }
}
