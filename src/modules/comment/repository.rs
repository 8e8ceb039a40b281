use uuid::Uuid;

use crate::api::error;
use crate::modules::comment::model::{
    Comment, CommentPage, CommentSort, CreateCommentBody, UpdateCommentBody,
};
use crate::modules::feed::model::LikeOutcome;

#[async_trait::async_trait]
pub trait CommentApi {
    async fn fetch_page(
        &self,
        travel_log_id: Uuid,
        page: u32,
        sort: CommentSort,
    ) -> Result<CommentPage, error::Error>;

    async fn fetch_replies(&self, comment_id: Uuid) -> Result<Vec<Comment>, error::Error>;

    async fn create(&self, body: &CreateCommentBody) -> Result<Comment, error::Error>;

    async fn update(
        &self,
        comment_id: Uuid,
        body: &UpdateCommentBody,
    ) -> Result<Comment, error::Error>;

    async fn delete(&self, comment_id: Uuid) -> Result<(), error::Error>;

    async fn toggle_like(&self, comment_id: Uuid) -> Result<LikeOutcome, error::Error>;
}
