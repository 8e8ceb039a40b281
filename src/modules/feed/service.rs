use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::error;
use crate::cache::QueryCache;
use crate::constants::FEED_TTL;
use crate::modules::feed::filter::FilterState;
use crate::modules::feed::model::{FeedEntry, FeedPage, LikeOutcome};
use crate::modules::feed::repository::FeedApi;

const FEED_PREFIX: &str = "feed:";

fn feed_page_key(page: u32) -> String {
    format!("feed:{page}")
}

#[derive(Debug, Default)]
struct FeedCursor {
    last_page: u32,
    total_pages: Option<u32>,
    in_flight: bool,
}

impl FeedCursor {
    fn has_more(&self) -> bool {
        match self.total_pages {
            None => true,
            Some(total) => self.last_page < total,
        }
    }
}

/// Append-only view over the paginated feed, plus the optimistic like toggle.
///
/// Pages are fetched strictly in order and live in the query cache, so a
/// toggle can rewrite them in place and an invalidation makes the next read
/// reconcile with the server. The flattened entry list is a pure
/// concatenation; ordering within pages is the server's.
#[derive(Clone)]
pub struct FeedService<F>
where
    F: FeedApi + Send + Sync,
{
    api: Arc<F>,
    cache: Arc<QueryCache>,
    cursor: Arc<Mutex<FeedCursor>>,
    like_locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl<F> FeedService<F>
where
    F: FeedApi + Send + Sync,
{
    pub fn with_dependencies(api: Arc<F>, cache: Arc<QueryCache>) -> Self {
        FeedService {
            api,
            cache,
            cursor: Arc::new(Mutex::new(FeedCursor::default())),
            like_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Requests the page after the last fetched one. Returns `false` without
    /// any network traffic when a fetch is already in flight or the last
    /// page said there is nothing further.
    pub async fn fetch_next_page(&self) -> Result<bool, error::Error> {
        let target = {
            let mut cursor = self.cursor.lock().await;
            if cursor.in_flight || !cursor.has_more() {
                return Ok(false);
            }
            cursor.in_flight = true;
            cursor.last_page + 1
        };

        let api = Arc::clone(&self.api);
        let result = self
            .cache
            .get_or_fetch(&feed_page_key(target), FEED_TTL, move || async move {
                api.fetch_page(target).await
            })
            .await;

        let mut cursor = self.cursor.lock().await;
        cursor.in_flight = false;
        match result {
            Ok(page) => {
                cursor.last_page = target;
                cursor.total_pages = Some(page.pagination.total_pages);
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn has_next_page(&self) -> bool {
        self.cursor.lock().await.has_more()
    }

    /// The flattened feed: every fetched page's entries, in fetch order.
    /// Pages dropped by an invalidation are refetched here.
    pub async fn entries(&self) -> Result<Vec<FeedEntry>, error::Error> {
        let last_page = self.cursor.lock().await.last_page;

        let mut all = Vec::new();
        for page_no in 1..=last_page {
            let api = Arc::clone(&self.api);
            let page: FeedPage = self
                .cache
                .get_or_fetch(&feed_page_key(page_no), FEED_TTL, move || async move {
                    api.fetch_page(page_no).await
                })
                .await?;
            all.extend(page.data);
        }
        Ok(all)
    }

    pub async fn filtered_entries(
        &self,
        filter: &FilterState,
    ) -> Result<Vec<FeedEntry>, error::Error> {
        Ok(filter.apply(self.entries().await?))
    }

    /// Drops the assembled pages and starts over from page one.
    pub async fn reset(&self) {
        let mut cursor = self.cursor.lock().await;
        self.cache.invalidate_prefix(FEED_PREFIX).await;
        *cursor = FeedCursor::default();
    }

    /// Optimistic like toggle. The cached pages are rewritten before the
    /// request is sent; a success invalidates them so the next read picks up
    /// the server-computed count, a failure restores the snapshot exactly.
    /// Toggles on one entry are serialized so a rapid double-toggle cannot
    /// both read the same pre-mutation state.
    pub async fn toggle_like(&self, travel_log_id: Uuid) -> Result<LikeOutcome, error::Error> {
        let lock = self.lock_for(travel_log_id).await;
        let _guard = lock.lock().await;

        let snapshot = self.cache.snapshot(&[FEED_PREFIX]).await;
        let last_page = self.cursor.lock().await.last_page;
        for page_no in 1..=last_page {
            self.cache
                .update_cached::<FeedPage, _>(&feed_page_key(page_no), |page| {
                    let mut changed = false;
                    for entry in &mut page.data {
                        if entry.id == travel_log_id {
                            flip_like(entry);
                            changed = true;
                        }
                    }
                    changed
                })
                .await?;
        }

        match self.api.toggle_like(travel_log_id).await {
            Ok(outcome) => {
                self.cache.invalidate_prefix(FEED_PREFIX).await;
                Ok(outcome)
            }
            Err(err) => {
                self.cache.restore(snapshot).await;
                Err(err)
            }
        }
    }

    async fn lock_for(&self, travel_log_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.like_locks.lock().await;
        locks.entry(travel_log_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

fn flip_like(entry: &mut FeedEntry) {
    entry.liked_by_me = !entry.liked_by_me;
    if entry.liked_by_me {
        entry.like_count += 1;
    } else {
        entry.like_count = entry.like_count.saturating_sub(1);
    }
}
