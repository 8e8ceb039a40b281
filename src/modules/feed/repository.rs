use uuid::Uuid;

use crate::api::error;
use crate::modules::feed::model::{FeedPage, LikeOutcome};

#[async_trait::async_trait]
pub trait FeedApi {
    async fn fetch_page(&self, page: u32) -> Result<FeedPage, error::Error>;

    async fn toggle_like(&self, travel_log_id: Uuid) -> Result<LikeOutcome, error::Error>;
}
