//! Client-side synchronization engine for a travel-journal social app.
//!
//! Talks to the backend REST API and keeps a process-wide query cache with
//! per-query staleness windows, optimistic like toggles with exact rollback,
//! append-only feed pagination, a one-level comment tree, and the
//! friend-request state machine. Only the signed-in session survives a
//! restart; everything else is memory-only and rebuilt on demand.

pub mod api;
pub mod cache;
pub mod configs;
pub mod constants;
pub mod modules;
pub mod utils;

use std::sync::Arc;

use crate::api::error;
use crate::cache::QueryCache;
use crate::configs::{build_http_client, HttpTransport};
use crate::constants::Env;
use crate::modules::auth::repository_http::AuthApiHttp;
use crate::modules::auth::service::AuthService;
use crate::modules::comment::repository_http::CommentApiHttp;
use crate::modules::comment::service::CommentService;
use crate::modules::feed::repository_http::FeedApiHttp;
use crate::modules::feed::service::FeedService;
use crate::modules::friend::repository_http::FriendApiHttp;
use crate::modules::friend::service::FriendService;
use crate::utils::SessionStore;

pub use crate::api::error::Error;
pub use crate::modules::auth::model::UserProfile;
pub use crate::modules::comment::model::{Comment, CommentSort};
pub use crate::modules::feed::filter::FilterState;
pub use crate::modules::feed::model::{Emotion, FeedEntry, LikeOutcome};
pub use crate::modules::friend::model::{
    AnnotatedUser, Friendship, FriendshipStatus, RelationAction, RelationToViewer,
};

/// One wired-up client: the four domain services sharing a session store,
/// an HTTP transport, and the query cache.
pub struct TravelogClient {
    pub auth: AuthService<AuthApiHttp>,
    pub feed: FeedService<FeedApiHttp>,
    pub comments: CommentService<CommentApiHttp>,
    pub friends: FriendService<FriendApiHttp>,
    cache: Arc<QueryCache>,
}

impl TravelogClient {
    pub fn from_env() -> Result<Self, error::Error> {
        Self::new(Env::default())
    }

    pub fn new(env: Env) -> Result<Self, error::Error> {
        let http = build_http_client(&env)?;
        let session = Arc::new(SessionStore::open(env.session_file.clone())?);
        let cache = Arc::new(QueryCache::new());
        let transport =
            Arc::new(HttpTransport::new(http, env.api_base_url.clone(), Arc::clone(&session)));

        let auth = AuthService::with_dependencies(
            Arc::new(AuthApiHttp::new(Arc::clone(&transport))),
            Arc::clone(&session),
            Arc::clone(&cache),
        );
        let feed = FeedService::with_dependencies(
            Arc::new(FeedApiHttp::new(Arc::clone(&transport))),
            Arc::clone(&cache),
        );
        let comments = CommentService::with_dependencies(
            Arc::new(CommentApiHttp::new(Arc::clone(&transport))),
            Arc::clone(&cache),
        );
        let friends = FriendService::with_dependencies(
            Arc::new(FriendApiHttp::new(transport)),
            Arc::clone(&cache),
            session,
        );

        Ok(TravelogClient { auth, feed, comments, friends, cache })
    }

    /// Drops every cached query; the next read of each key refetches.
    pub async fn invalidate_all(&self) {
        self.cache.clear().await;
    }
}
