use crate::api::error;
use crate::modules::auth::model::{AuthResponse, LoginBody, RegisterBody};

#[async_trait::async_trait]
pub trait AuthApi {
    async fn login(&self, body: &LoginBody) -> Result<AuthResponse, error::Error>;
    async fn register(&self, body: &RegisterBody) -> Result<AuthResponse, error::Error>;
}
