use std::path::PathBuf;
use std::time::Duration;

// Staleness windows per query kind. A cached read younger than its window is
// served without a network call; anything older refetches on next read.
pub const COMMENTS_TTL: Duration = Duration::from_secs(30);
pub const FRIEND_REQUESTS_TTL: Duration = Duration::from_secs(30);
pub const FRIENDSHIPS_TTL: Duration = Duration::from_secs(5 * 60);
pub const USER_SEARCH_TTL: Duration = Duration::from_secs(2 * 60);
pub const FEED_TTL: Duration = Duration::from_secs(5 * 60);
pub const PROFILE_TTL: Duration = Duration::from_secs(60 * 60);

/// Read queries retry this many times on transient failure. Mutations: never.
pub const QUERY_RETRIES: u32 = 1;

pub struct Env {
    pub api_base_url: String,
    pub http_timeout_secs: u64,
    pub session_file: Option<PathBuf>,
}

impl Env {
    fn new() -> Self {
        dotenvy::dotenv().ok();

        let api_base_url = std::env::var("API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080/api".to_string());

        let http_timeout_secs = std::env::var("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .expect("HTTP_TIMEOUT_SECS must be a valid u64 integer");

        let session_file = std::env::var("SESSION_FILE").ok().map(PathBuf::from);

        Env { api_base_url, http_timeout_secs, session_file }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
