use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::api::error;
use crate::modules::auth::model::UserProfile;

/// Registered claims carried by the backend's access tokens. The signing
/// secret never leaves the server, so the client decodes without verifying.
/// That is enough to read the expiry and refuse to send doomed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: uuid::Uuid,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    pub fn decode_unverified(token: &str) -> Result<Self, error::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<Self>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data.claims)
    }

    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp() as u64;
        now >= self.exp
    }
}

/// The one piece of state that survives a restart: who is signed in and
/// their bearer token, kept as a JSON file under the user's config dir.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: UserProfile,
    pub access_token: String,
}

pub struct SessionStore {
    path: PathBuf,
    current: Mutex<Option<Session>>,
}

impl SessionStore {
    /// Opens the store, loading a previously persisted session if one exists.
    /// An unreadable session file is discarded, not fatal.
    pub fn open(path: Option<PathBuf>) -> Result<Self, error::Error> {
        let path = match path {
            Some(path) => path,
            None => default_session_path()?,
        };

        let current = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Session>(&bytes) {
                Ok(session) => Some(session),
                Err(err) => {
                    log::warn!("discarding unreadable session file: {err}");
                    None
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };

        Ok(SessionStore { path, current: Mutex::new(current) })
    }

    pub fn save(&self, session: Session) -> Result<(), error::Error> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(&session)?)?;
        *self.lock() = Some(session);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), error::Error> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        *self.lock() = None;
        Ok(())
    }

    pub fn current(&self) -> Option<Session> {
        self.lock().clone()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.lock().as_ref().map(|s| s.user.clone())
    }

    /// Bearer token for an authenticated call. A missing or expired session
    /// fails here, before any network I/O happens.
    pub fn bearer(&self) -> Result<String, error::Error> {
        let session =
            self.current().ok_or_else(|| error::Error::unauthorized("Not signed in"))?;

        let claims = Claims::decode_unverified(&session.access_token)?;
        if claims.is_expired() {
            return Err(error::Error::unauthorized("Token Invalid or Expired"));
        }

        Ok(session.access_token)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn default_session_path() -> Result<PathBuf, error::Error> {
    let base = dirs::config_dir()
        .ok_or_else(|| error::Error::storage("no config directory available"))?;
    Ok(base.join("travelog").join("session.json"))
}

/// Tag comparisons ignore case and a leading `#`.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    fn profile() -> UserProfile {
        UserProfile {
            id: Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)),
            username: "mina".into(),
            display_name: "Mina Park".into(),
            avatar_url: None,
        }
    }

    fn token(exp_offset_secs: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)),
            iat: now as u64,
            exp: (now + exp_offset_secs) as u64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(b"test"))
            .unwrap()
    }

    #[test]
    fn session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::open(Some(path.clone())).unwrap();
        assert!(store.current().is_none());
        store.save(Session { user: profile(), access_token: token(3600) }).unwrap();

        let reopened = SessionStore::open(Some(path)).unwrap();
        assert_eq!(reopened.current_user().unwrap().username, "mina");
    }

    #[test]
    fn clear_removes_persisted_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::open(Some(path.clone())).unwrap();
        store.save(Session { user: profile(), access_token: token(3600) }).unwrap();
        store.clear().unwrap();

        assert!(store.bearer().is_err());
        assert!(SessionStore::open(Some(path)).unwrap().current().is_none());
    }

    #[test]
    fn expired_token_blocks_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(Some(dir.path().join("session.json"))).unwrap();
        store.save(Session { user: profile(), access_token: token(-60) }).unwrap();

        let err = store.bearer().unwrap_err();
        assert!(matches!(err, error::Error::Unauthorized(_)));
    }

    #[test]
    fn valid_token_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(Some(dir.path().join("session.json"))).unwrap();
        let access_token = token(3600);
        store.save(Session { user: profile(), access_token: access_token.clone() }).unwrap();

        assert_eq!(store.bearer().unwrap(), access_token);
    }

    #[test]
    fn tags_normalize_case_and_hash_prefix() {
        assert_eq!(normalize_tag("#Beach"), "beach");
        assert_eq!(normalize_tag(" 바다 "), "바다");
        assert_eq!(normalize_tag("#여행"), "여행");
    }
}
