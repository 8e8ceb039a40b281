use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::error::{self, ErrorBody};
use crate::constants::{Env, QUERY_RETRIES};
use crate::utils::SessionStore;

pub fn build_http_client(env: &Env) -> Result<reqwest::Client, error::Error> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(env.http_timeout_secs))
        .build()
        .map_err(|e| error::Error::network(e.to_string()))?;
    Ok(client)
}

/// Shared HTTP plumbing for the per-module API implementations: base-url
/// joining, bearer injection from the session, envelope-aware error mapping,
/// and the read-query retry.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, base_url: String, session: Arc<SessionStore>) -> Self {
        HttpTransport { client, base_url: base_url.trim_end_matches('/').to_string(), session }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authenticated GET. Retries once on transient failure.
    pub async fn get_json<T>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, error::Error>
    where
        T: DeserializeOwned,
    {
        let bearer = self.session.bearer()?;
        let mut attempt = 0;
        loop {
            let result = async {
                let resp = self
                    .client
                    .get(self.url(path))
                    .bearer_auth(&bearer)
                    .query(query)
                    .send()
                    .await?;
                Self::parse::<T>(resp).await
            }
            .await;

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < QUERY_RETRIES => {
                    attempt += 1;
                    log::warn!("retrying GET {path} after: {err}");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Authenticated POST. Mutations are never retried.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, error::Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bearer = self.session.bearer()?;
        let resp =
            self.client.post(self.url(path)).bearer_auth(&bearer).json(body).send().await?;
        Self::parse(resp).await
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T, error::Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bearer = self.session.bearer()?;
        let resp =
            self.client.patch(self.url(path)).bearer_auth(&bearer).json(body).send().await?;
        Self::parse(resp).await
    }

    /// Authenticated DELETE; tolerates an empty (204) response body.
    pub async fn delete(&self, path: &str) -> Result<(), error::Error> {
        let bearer = self.session.bearer()?;
        let resp = self.client.delete(self.url(path)).bearer_auth(&bearer).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::status_error(status, resp).await)
    }

    /// Authenticated POST without a request body, response parsed.
    pub async fn post_no_body<T>(&self, path: &str) -> Result<T, error::Error>
    where
        T: DeserializeOwned,
    {
        let bearer = self.session.bearer()?;
        let resp = self.client.post(self.url(path)).bearer_auth(&bearer).send().await?;
        Self::parse(resp).await
    }

    /// Authenticated POST without a request body, tolerating an empty (204)
    /// response.
    pub async fn post_no_content(&self, path: &str) -> Result<(), error::Error> {
        let bearer = self.session.bearer()?;
        let resp = self.client.post(self.url(path)).bearer_auth(&bearer).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::status_error(status, resp).await)
    }

    /// Unauthenticated POST, for login/register.
    pub async fn post_public<B, T>(&self, path: &str, body: &B) -> Result<T, error::Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        Self::parse(resp).await
    }

    async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, error::Error> {
        let status = resp.status();
        if status.is_success() {
            return resp.json::<T>().await.map_err(error::Error::from);
        }
        Err(Self::status_error(status, resp).await)
    }

    async fn status_error(status: StatusCode, resp: reqwest::Response) -> error::Error {
        let message = resp.json::<ErrorBody>().await.map(|body| body.message).unwrap_or_else(
            |_| status.canonical_reason().unwrap_or("request failed").to_string(),
        );
        error::Error::from_status(status, message)
    }
}
