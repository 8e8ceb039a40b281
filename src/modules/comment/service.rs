use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::error;
use crate::cache::QueryCache;
use crate::constants::COMMENTS_TTL;
use crate::modules::comment::model::{
    Comment, CommentPage, CommentSort, CreateCommentBody, UpdateCommentBody,
};
use crate::modules::comment::repository::CommentApi;
use crate::modules::feed::model::LikeOutcome;

const REPLIES_PREFIX: &str = "replies:";
const FEED_PREFIX: &str = "feed:";

fn comments_key(travel_log_id: Uuid, sort: CommentSort, page: u32) -> String {
    format!("comments:{travel_log_id}:{sort}:{page}")
}

fn comments_prefix(travel_log_id: Uuid) -> String {
    format!("comments:{travel_log_id}:")
}

fn replies_key(comment_id: Uuid) -> String {
    format!("replies:{comment_id}")
}

/// Per-entry comment tree: paginated top-level comments with eager one-level
/// replies. Create/edit/delete wait for the server and invalidate; only the
/// like toggle is optimistic.
#[derive(Clone)]
pub struct CommentService<C>
where
    C: CommentApi + Send + Sync,
{
    api: Arc<C>,
    cache: Arc<QueryCache>,
    like_locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl<C> CommentService<C>
where
    C: CommentApi + Send + Sync,
{
    pub fn with_dependencies(api: Arc<C>, cache: Arc<QueryCache>) -> Self {
        CommentService { api, cache, like_locks: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub async fn comments(
        &self,
        travel_log_id: Uuid,
        page: u32,
        sort: CommentSort,
    ) -> Result<CommentPage, error::Error> {
        let api = Arc::clone(&self.api);
        self.cache
            .get_or_fetch(
                &comments_key(travel_log_id, sort, page),
                COMMENTS_TTL,
                move || async move { api.fetch_page(travel_log_id, page, sort).await },
            )
            .await
    }

    pub async fn replies(&self, comment_id: Uuid) -> Result<Vec<Comment>, error::Error> {
        let api = Arc::clone(&self.api);
        self.cache
            .get_or_fetch(&replies_key(comment_id), COMMENTS_TTL, move || async move {
                api.fetch_replies(comment_id).await
            })
            .await
    }

    /// Posts a comment, or a reply when `parent_id` is given. Content must be
    /// non-empty after trimming; that is checked before any network call.
    pub async fn create_comment(
        &self,
        travel_log_id: Uuid,
        content: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Comment, error::Error> {
        let body = CreateCommentBody {
            travel_log_id,
            content: non_empty_trimmed(content)?,
            parent_id,
        };

        let comment = self.api.create(&body).await?;
        self.invalidate_tree(travel_log_id, parent_id, true).await;
        Ok(comment)
    }

    pub async fn edit_comment(
        &self,
        comment_id: Uuid,
        content: &str,
    ) -> Result<Comment, error::Error> {
        let body = UpdateCommentBody { content: non_empty_trimmed(content)? };

        let updated = self.api.update(comment_id, &body).await?;
        self.invalidate_tree(updated.travel_log_id, updated.parent_id, false).await;
        Ok(updated)
    }

    /// Deletion keeps the comment's slot: the server masks content and flags
    /// it, so refetched lists keep their length and ordering.
    pub async fn delete_comment(
        &self,
        travel_log_id: Uuid,
        comment_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<(), error::Error> {
        self.api.delete(comment_id).await?;
        self.invalidate_tree(travel_log_id, parent_id, true).await;
        Ok(())
    }

    /// Optimistic like toggle on a comment, top-level or reply. Rewrites
    /// every cached comment collection of the entry, then reconciles or
    /// rolls back exactly. Serialized per comment.
    pub async fn toggle_like(
        &self,
        travel_log_id: Uuid,
        comment_id: Uuid,
    ) -> Result<LikeOutcome, error::Error> {
        let lock = self.lock_for(comment_id).await;
        let _guard = lock.lock().await;

        let entry_prefix = comments_prefix(travel_log_id);
        let snapshot = self.cache.snapshot(&[&entry_prefix, REPLIES_PREFIX]).await;

        for key in self.cache.keys_with_prefix(&entry_prefix).await {
            self.cache
                .update_cached::<CommentPage, _>(&key, |page| {
                    flip_comment_like(&mut page.data, comment_id)
                })
                .await?;
        }
        for key in self.cache.keys_with_prefix(REPLIES_PREFIX).await {
            self.cache
                .update_cached::<Vec<Comment>, _>(&key, |replies| {
                    flip_comment_like(replies, comment_id)
                })
                .await?;
        }

        match self.api.toggle_like(comment_id).await {
            Ok(outcome) => {
                self.cache.invalidate_prefix(&entry_prefix).await;
                self.cache.invalidate_prefix(REPLIES_PREFIX).await;
                Ok(outcome)
            }
            Err(err) => {
                self.cache.restore(snapshot).await;
                Err(err)
            }
        }
    }

    async fn invalidate_tree(
        &self,
        travel_log_id: Uuid,
        parent_id: Option<Uuid>,
        counts_changed: bool,
    ) {
        self.cache.invalidate_prefix(&comments_prefix(travel_log_id)).await;
        if let Some(parent_id) = parent_id {
            self.cache.invalidate(&replies_key(parent_id)).await;
        }
        // Feed entries embed comment counts.
        if counts_changed {
            self.cache.invalidate_prefix(FEED_PREFIX).await;
        }
    }

    async fn lock_for(&self, comment_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.like_locks.lock().await;
        locks.entry(comment_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

fn non_empty_trimmed(content: &str) -> Result<String, error::Error> {
    use validator::Validate;

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(error::Error::validation("Comment content cannot be empty"));
    }
    let body = UpdateCommentBody { content: trimmed.to_string() };
    body.validate()?;
    Ok(body.content)
}

fn flip_comment_like(comments: &mut [Comment], comment_id: Uuid) -> bool {
    let mut changed = false;
    for comment in comments {
        if comment.id == comment_id {
            comment.liked_by_me = !comment.liked_by_me;
            if comment.liked_by_me {
                comment.like_count += 1;
            } else {
                comment.like_count = comment.like_count.saturating_sub(1);
            }
            changed = true;
        }
        if flip_comment_like(&mut comment.replies, comment_id) {
            changed = true;
        }
    }
    changed
}
