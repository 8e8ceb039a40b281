use std::sync::Arc;

use uuid::Uuid;

use crate::api::error;
use crate::configs::HttpTransport;
use crate::modules::feed::model::{FeedPage, LikeOutcome, ToggleLikeBody};
use crate::modules::feed::repository::FeedApi;

pub struct FeedApiHttp {
    transport: Arc<HttpTransport>,
}

impl FeedApiHttp {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        FeedApiHttp { transport }
    }
}

#[async_trait::async_trait]
impl FeedApi for FeedApiHttp {
    async fn fetch_page(&self, page: u32) -> Result<FeedPage, error::Error> {
        self.transport.get_json("/feed", &[("page", page.to_string())]).await
    }

    async fn toggle_like(&self, travel_log_id: Uuid) -> Result<LikeOutcome, error::Error> {
        self.transport.post_json("/likes/toggle", &ToggleLikeBody { travel_log_id }).await
    }
}
