use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::envelope::Paginated;
use crate::modules::auth::model::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentSort {
    Latest,
    Oldest,
}

impl std::fmt::Display for CommentSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommentSort::Latest => write!(f, "latest"),
            CommentSort::Oldest => write!(f, "oldest"),
        }
    }
}

/// A comment on a travel entry. `parent_id` is set on replies, which nest
/// exactly one level; top-level comments carry their replies eagerly.
/// Deleted comments keep their identifier and position: the server masks
/// the content and sets `is_deleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub travel_log_id: Uuid,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    pub user: UserProfile,
    pub content: String,
    pub like_count: u32,
    pub liked_by_me: bool,
    pub is_edited: bool,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

pub type CommentPage = Paginated<Comment>;

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentBody {
    pub travel_log_id: Uuid,
    #[validate(length(min = 1, max = 1000, message = "Comment must be 1-1000 characters"))]
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct UpdateCommentBody {
    #[validate(length(min = 1, max = 1000, message = "Comment must be 1-1000 characters"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleCommentLikeBody {
    pub comment_id: Uuid,
}
