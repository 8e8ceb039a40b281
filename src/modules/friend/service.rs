use std::sync::Arc;

use futures_util::try_join;
use uuid::Uuid;

use crate::api::error;
use crate::cache::QueryCache;
use crate::constants::{FRIENDSHIPS_TTL, FRIEND_REQUESTS_TTL, PROFILE_TTL, USER_SEARCH_TTL};
use crate::modules::auth::model::UserProfile;
use crate::modules::friend::model::{
    AnnotatedUser, Friendship, FriendshipStatus, RelationToViewer,
};
use crate::modules::friend::repository::FriendApi;
use crate::utils::SessionStore;

const FRIENDSHIPS_PREFIX: &str = "friendships:";
const FRIEND_REQUESTS_KEY: &str = "friend_requests";
const USER_SEARCH_PREFIX: &str = "user_search:";

fn friendships_key(status: Option<FriendshipStatus>) -> String {
    match status {
        Some(status) => format!("friendships:{status}"),
        None => "friendships:all".to_string(),
    }
}

fn user_search_key(query: &str) -> String {
    format!("user_search:{query}")
}

/// Friend-graph state machine as seen from the signed-in viewer: cached
/// relation lists, guarded request transitions, and search results annotated
/// with the one action their current relation admits.
#[derive(Clone)]
pub struct FriendService<F>
where
    F: FriendApi + Send + Sync,
{
    api: Arc<F>,
    cache: Arc<QueryCache>,
    session: Arc<SessionStore>,
}

impl<F> FriendService<F>
where
    F: FriendApi + Send + Sync,
{
    pub fn with_dependencies(
        api: Arc<F>,
        cache: Arc<QueryCache>,
        session: Arc<SessionStore>,
    ) -> Self {
        FriendService { api, cache, session }
    }

    pub async fn friends(&self) -> Result<Vec<Friendship>, error::Error> {
        self.friendships(Some(FriendshipStatus::Accepted)).await
    }

    pub async fn friendships(
        &self,
        status: Option<FriendshipStatus>,
    ) -> Result<Vec<Friendship>, error::Error> {
        let api = Arc::clone(&self.api);
        self.cache
            .get_or_fetch(&friendships_key(status), FRIENDSHIPS_TTL, move || async move {
                api.list_friendships(status).await
            })
            .await
    }

    /// Open requests, sent and received. Fresher window than the friendship
    /// lists since these drive notification badges.
    pub async fn pending_requests(&self) -> Result<Vec<Friendship>, error::Error> {
        let api = Arc::clone(&self.api);
        self.cache
            .get_or_fetch(FRIEND_REQUESTS_KEY, FRIEND_REQUESTS_TTL, move || async move {
                api.list_friendships(Some(FriendshipStatus::Pending)).await
            })
            .await
    }

    /// Display profile of any user, cached long: profile details change
    /// rarely and every comment and feed entry embeds them anyway.
    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile, error::Error> {
        let api = Arc::clone(&self.api);
        self.cache
            .get_or_fetch(&format!("profile:{user_id}"), PROFILE_TTL, move || async move {
                api.fetch_profile(user_id).await
            })
            .await
    }

    /// Searches users and annotates every candidate with their relation to
    /// the viewer. The viewer themself is dropped from the results.
    pub async fn search_users(&self, query: &str) -> Result<Vec<AnnotatedUser>, error::Error> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let viewer_id = self.viewer_id()?;

        let api = Arc::clone(&self.api);
        let owned = query.to_string();
        let results: Vec<_> = self
            .cache
            .get_or_fetch(&user_search_key(query), USER_SEARCH_TTL, move || async move {
                api.search_users(&owned).await
            })
            .await?;

        let (accepted, pending) = try_join!(self.friends(), self.pending_requests())?;

        Ok(results
            .into_iter()
            .filter(|user| user.id != viewer_id)
            .map(|user| {
                let relation = relation_for(viewer_id, user.id, &accepted, &pending);
                AnnotatedUser { user, relation }
            })
            .collect())
    }

    pub async fn send_request(&self, addressee_id: Uuid) -> Result<Friendship, error::Error> {
        let viewer_id = self.viewer_id()?;
        if addressee_id == viewer_id {
            return Err(error::Error::bad_request("Cannot send friend request to yourself"));
        }

        let (accepted, pending) = try_join!(self.friends(), self.pending_requests())?;
        match relation_for(viewer_id, addressee_id, &accepted, &pending) {
            RelationToViewer::Accepted => {
                return Err(error::Error::bad_request("Users are already friends"));
            }
            RelationToViewer::PendingSent | RelationToViewer::PendingReceived => {
                return Err(error::Error::bad_request("Friend request already exists"));
            }
            RelationToViewer::None => {}
        }

        let friendship = self.api.send_request(addressee_id).await?;
        self.invalidate_relations().await;
        Ok(friendship)
    }

    /// Only the addressee of a pending request may accept it.
    pub async fn accept_request(&self, friendship_id: Uuid) -> Result<Friendship, error::Error> {
        let viewer_id = self.viewer_id()?;
        let request = self.find_pending(friendship_id).await?;
        if request.addressee.id != viewer_id {
            return Err(error::Error::forbidden(
                "You are not allowed to accept this friend request",
            ));
        }

        let friendship = self.api.accept_request(friendship_id).await?;
        self.invalidate_relations().await;
        Ok(friendship)
    }

    /// Rejection is terminal for the request; only the addressee may do it.
    pub async fn reject_request(&self, friendship_id: Uuid) -> Result<(), error::Error> {
        let viewer_id = self.viewer_id()?;
        let request = self.find_pending(friendship_id).await?;
        if request.addressee.id != viewer_id {
            return Err(error::Error::forbidden(
                "You are not allowed to decline this friend request",
            ));
        }

        self.api.reject_request(friendship_id).await?;
        self.invalidate_relations().await;
        Ok(())
    }

    /// Deletes the record: an accepted friendship (either party) or the
    /// viewer's own still-pending request (the "Cancel" action).
    pub async fn remove_friendship(&self, friendship_id: Uuid) -> Result<(), error::Error> {
        self.api.remove_friendship(friendship_id).await?;
        self.invalidate_relations().await;
        Ok(())
    }

    async fn find_pending(&self, friendship_id: Uuid) -> Result<Friendship, error::Error> {
        let pending = self.pending_requests().await?;
        pending
            .into_iter()
            .find(|f| f.id == friendship_id)
            .ok_or_else(|| error::Error::not_found("Friend request not found"))
    }

    fn viewer_id(&self) -> Result<Uuid, error::Error> {
        self.session
            .current_user()
            .map(|user| user.id)
            .ok_or_else(|| error::Error::unauthorized("Not signed in"))
    }

    async fn invalidate_relations(&self) {
        self.cache.invalidate_prefix(FRIENDSHIPS_PREFIX).await;
        self.cache.invalidate(FRIEND_REQUESTS_KEY).await;
        self.cache.invalidate_prefix(USER_SEARCH_PREFIX).await;
    }
}

fn relation_for(
    viewer_id: Uuid,
    candidate_id: Uuid,
    accepted: &[Friendship],
    pending: &[Friendship],
) -> RelationToViewer {
    if accepted.iter().any(|f| f.involves(viewer_id, candidate_id)) {
        return RelationToViewer::Accepted;
    }
    if let Some(request) = pending.iter().find(|f| f.involves(viewer_id, candidate_id)) {
        return if request.requester.id == viewer_id {
            RelationToViewer::PendingSent
        } else {
            RelationToViewer::PendingReceived
        };
    }
    RelationToViewer::None
}
