use std::sync::Arc;

use uuid::Uuid;

use crate::api::envelope::ApiEnvelope;
use crate::api::error;
use crate::configs::HttpTransport;
use crate::modules::comment::model::{
    Comment, CommentPage, CommentSort, CreateCommentBody, ToggleCommentLikeBody,
    UpdateCommentBody,
};
use crate::modules::comment::repository::CommentApi;
use crate::modules::feed::model::LikeOutcome;

pub struct CommentApiHttp {
    transport: Arc<HttpTransport>,
}

impl CommentApiHttp {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        CommentApiHttp { transport }
    }
}

#[async_trait::async_trait]
impl CommentApi for CommentApiHttp {
    async fn fetch_page(
        &self,
        travel_log_id: Uuid,
        page: u32,
        sort: CommentSort,
    ) -> Result<CommentPage, error::Error> {
        self.transport
            .get_json(
                "/comments",
                &[
                    ("travelLogId", travel_log_id.to_string()),
                    ("page", page.to_string()),
                    ("sort", sort.to_string()),
                ],
            )
            .await
    }

    async fn fetch_replies(&self, comment_id: Uuid) -> Result<Vec<Comment>, error::Error> {
        let envelope: ApiEnvelope<Vec<Comment>> =
            self.transport.get_json(&format!("/comments/{comment_id}/replies"), &[]).await?;
        envelope.into_data()
    }

    async fn create(&self, body: &CreateCommentBody) -> Result<Comment, error::Error> {
        let envelope: ApiEnvelope<Comment> = self.transport.post_json("/comments", body).await?;
        envelope.into_data()
    }

    async fn update(
        &self,
        comment_id: Uuid,
        body: &UpdateCommentBody,
    ) -> Result<Comment, error::Error> {
        let envelope: ApiEnvelope<Comment> =
            self.transport.patch_json(&format!("/comments/{comment_id}"), body).await?;
        envelope.into_data()
    }

    async fn delete(&self, comment_id: Uuid) -> Result<(), error::Error> {
        self.transport.delete(&format!("/comments/{comment_id}")).await
    }

    async fn toggle_like(&self, comment_id: Uuid) -> Result<LikeOutcome, error::Error> {
        self.transport
            .post_json("/likes/comments/toggle", &ToggleCommentLikeBody { comment_id })
            .await
    }
}
