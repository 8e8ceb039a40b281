use std::sync::Arc;

use crate::api::envelope::ApiEnvelope;
use crate::api::error;
use crate::configs::HttpTransport;
use crate::modules::auth::model::{AuthResponse, LoginBody, RegisterBody};
use crate::modules::auth::repository::AuthApi;

pub struct AuthApiHttp {
    transport: Arc<HttpTransport>,
}

impl AuthApiHttp {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        AuthApiHttp { transport }
    }
}

#[async_trait::async_trait]
impl AuthApi for AuthApiHttp {
    async fn login(&self, body: &LoginBody) -> Result<AuthResponse, error::Error> {
        let envelope: ApiEnvelope<AuthResponse> =
            self.transport.post_public("/auth/login", body).await?;
        envelope.into_data()
    }

    async fn register(&self, body: &RegisterBody) -> Result<AuthResponse, error::Error> {
        let envelope: ApiEnvelope<AuthResponse> =
            self.transport.post_public("/auth/register", body).await?;
        envelope.into_data()
    }
}
