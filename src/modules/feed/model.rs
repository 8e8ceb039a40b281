use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::envelope::Paginated;
use crate::modules::auth::model::UserProfile;

/// The single emotion a journal entry is pinned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Excited,
    Peaceful,
    Nostalgic,
    Adventurous,
    Romantic,
    Melancholy,
    Tired,
}

/// A travel-journal entry as the feed serves it: the record itself plus the
/// social counters and the owner's display profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub place_name: String,
    pub country: String,
    pub emotion: Emotion,
    #[serde(default)]
    pub photos: Vec<String>,
    pub diary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub like_count: u32,
    pub liked_by_me: bool,
    pub view_count: u32,
    pub comment_count: u32,
    pub user: UserProfile,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub type FeedPage = Paginated<FeedEntry>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeBody {
    pub travel_log_id: Uuid,
}

/// Server answer to a like toggle; `liked` is the authoritative new state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeOutcome {
    pub liked: bool,
    #[serde(default)]
    pub message: Option<String>,
}
