use std::sync::Arc;

use log::info;
use validator::Validate;

use crate::api::error;
use crate::cache::QueryCache;
use crate::modules::auth::model::{LoginBody, RegisterBody, UserProfile};
use crate::modules::auth::repository::AuthApi;
use crate::utils::{Session, SessionStore};

/// Sign-in/sign-up against the backend plus the persisted session that every
/// authenticated query draws its bearer token from.
#[derive(Clone)]
pub struct AuthService<A>
where
    A: AuthApi + Send + Sync,
{
    api: Arc<A>,
    session: Arc<SessionStore>,
    cache: Arc<QueryCache>,
}

impl<A> AuthService<A>
where
    A: AuthApi + Send + Sync,
{
    pub fn with_dependencies(
        api: Arc<A>,
        session: Arc<SessionStore>,
        cache: Arc<QueryCache>,
    ) -> Self {
        AuthService { api, session, cache }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, error::Error> {
        let body = LoginBody { email: email.trim().to_string(), password: password.to_string() };
        body.validate()?;

        let auth = self.api.login(&body).await?;
        self.session
            .save(Session { user: auth.user.clone(), access_token: auth.access_token })?;
        info!("signed in as {}", auth.user.username);

        Ok(auth.user)
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<UserProfile, error::Error> {
        let body = RegisterBody {
            email: email.trim().to_string(),
            password: password.to_string(),
            username: username.trim().to_string(),
        };
        body.validate()?;

        let auth = self.api.register(&body).await?;
        self.session
            .save(Session { user: auth.user.clone(), access_token: auth.access_token })?;
        info!("registered as {}", auth.user.username);

        Ok(auth.user)
    }

    /// Drops the persisted session and every cached query of the old viewer.
    pub async fn logout(&self) -> Result<(), error::Error> {
        self.session.clear()?;
        self.cache.clear().await;
        Ok(())
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.session.current_user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.bearer().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::model::AuthResponse;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct FakeAuthApi {
        calls: AtomicUsize,
        user: UserProfile,
    }

    impl FakeAuthApi {
        fn new() -> Self {
            FakeAuthApi {
                calls: AtomicUsize::new(0),
                user: UserProfile {
                    id: Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)),
                    username: "mina".into(),
                    display_name: "Mina Park".into(),
                    avatar_url: None,
                },
            }
        }

        fn token(&self) -> String {
            let now = chrono::Utc::now().timestamp() as u64;
            let claims =
                crate::utils::Claims { sub: self.user.id, iat: now, exp: now + 3600 };
            encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(b"test"))
                .unwrap()
        }
    }

    #[async_trait::async_trait]
    impl AuthApi for FakeAuthApi {
        async fn login(&self, _body: &LoginBody) -> Result<AuthResponse, error::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AuthResponse { access_token: self.token(), user: self.user.clone() })
        }

        async fn register(&self, _body: &RegisterBody) -> Result<AuthResponse, error::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AuthResponse { access_token: self.token(), user: self.user.clone() })
        }
    }

    fn service(dir: &tempfile::TempDir) -> (AuthService<FakeAuthApi>, Arc<FakeAuthApi>) {
        let api = Arc::new(FakeAuthApi::new());
        let session =
            Arc::new(SessionStore::open(Some(dir.path().join("session.json"))).unwrap());
        let svc = AuthService::with_dependencies(
            api.clone(),
            session,
            Arc::new(QueryCache::new()),
        );
        (svc, api)
    }

    #[tokio::test]
    async fn invalid_email_never_reaches_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, api) = service(&dir);

        let err = svc.login("not-an-email", "password123").await.unwrap_err();
        assert!(matches!(err, error::Error::Validation(_)));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn login_persists_session() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, _api) = service(&dir);

        let user = svc.login("mina@example.com", "password123").await.unwrap();
        assert_eq!(user.username, "mina");
        assert!(svc.is_authenticated());
        assert_eq!(svc.current_user().unwrap().username, "mina");
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, _api) = service(&dir);

        svc.login("mina@example.com", "password123").await.unwrap();
        svc.logout().await.unwrap();

        assert!(!svc.is_authenticated());
        assert!(svc.current_user().is_none());
    }
}
