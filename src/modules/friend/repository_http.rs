use std::sync::Arc;

use uuid::Uuid;

use crate::api::envelope::ApiEnvelope;
use crate::api::error;
use crate::configs::HttpTransport;
use crate::modules::auth::model::UserProfile;
use crate::modules::friend::model::{FriendRequestBody, Friendship, FriendshipStatus};
use crate::modules::friend::repository::FriendApi;

pub struct FriendApiHttp {
    transport: Arc<HttpTransport>,
}

impl FriendApiHttp {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        FriendApiHttp { transport }
    }
}

#[async_trait::async_trait]
impl FriendApi for FriendApiHttp {
    async fn search_users(&self, query: &str) -> Result<Vec<UserProfile>, error::Error> {
        let envelope: ApiEnvelope<Vec<UserProfile>> =
            self.transport.get_json("/users/search", &[("q", query.to_string())]).await?;
        envelope.into_data()
    }

    async fn fetch_profile(&self, user_id: Uuid) -> Result<UserProfile, error::Error> {
        let envelope: ApiEnvelope<UserProfile> =
            self.transport.get_json(&format!("/users/{user_id}"), &[]).await?;
        envelope.into_data()
    }

    async fn list_friendships(
        &self,
        status: Option<FriendshipStatus>,
    ) -> Result<Vec<Friendship>, error::Error> {
        let mut query = Vec::new();
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        let envelope: ApiEnvelope<Vec<Friendship>> =
            self.transport.get_json("/friendships", &query).await?;
        envelope.into_data()
    }

    async fn send_request(&self, addressee_id: Uuid) -> Result<Friendship, error::Error> {
        let envelope: ApiEnvelope<Friendship> = self
            .transport
            .post_json("/friendships/requests", &FriendRequestBody { addressee_id })
            .await?;
        envelope.into_data()
    }

    async fn accept_request(&self, friendship_id: Uuid) -> Result<Friendship, error::Error> {
        let envelope: ApiEnvelope<Friendship> = self
            .transport
            .post_no_body(&format!("/friendships/requests/{friendship_id}/accept"))
            .await?;
        envelope.into_data()
    }

    async fn reject_request(&self, friendship_id: Uuid) -> Result<(), error::Error> {
        self.transport
            .post_no_content(&format!("/friendships/requests/{friendship_id}/reject"))
            .await
    }

    async fn remove_friendship(&self, friendship_id: Uuid) -> Result<(), error::Error> {
        self.transport.delete(&format!("/friendships/{friendship_id}")).await
    }
}
