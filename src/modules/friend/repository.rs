use uuid::Uuid;

use crate::api::error;
use crate::modules::auth::model::UserProfile;
use crate::modules::friend::model::{Friendship, FriendshipStatus};

#[async_trait::async_trait]
pub trait FriendApi {
    /// Case-insensitive partial match on username or display name.
    async fn search_users(&self, query: &str) -> Result<Vec<UserProfile>, error::Error>;

    async fn fetch_profile(&self, user_id: Uuid) -> Result<UserProfile, error::Error>;

    async fn list_friendships(
        &self,
        status: Option<FriendshipStatus>,
    ) -> Result<Vec<Friendship>, error::Error>;

    async fn send_request(&self, addressee_id: Uuid) -> Result<Friendship, error::Error>;

    async fn accept_request(&self, friendship_id: Uuid) -> Result<Friendship, error::Error>;

    async fn reject_request(&self, friendship_id: Uuid) -> Result<(), error::Error>;

    async fn remove_friendship(&self, friendship_id: Uuid) -> Result<(), error::Error>;
}
