//! Outbound request pathway.
//!
//! Every call to the remote API goes through [`ApiClient`]. It holds one
//! authorization slot shared by all clones: setting a token affects every
//! request issued afterwards, process-wide. A request already in flight keeps
//! the token it started with.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use neemaflex_auth::AccessToken;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_base: String,
    auth: Arc<RwLock<Option<AccessToken>>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: config.api_base(),
            auth: Arc::new(RwLock::new(None)),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Install (or with `None`, remove) the token attached to every request.
    pub fn set_auth_token(&self, token: Option<AccessToken>) {
        let mut slot = self.auth.write().unwrap_or_else(PoisonError::into_inner);
        *slot = token;
    }

    /// The token subsequent requests will carry.
    pub fn auth_token(&self) -> Option<AccessToken> {
        self.auth
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    pub async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send(Method::GET, path, None::<&()>).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PUT, path, Some(body)).await
    }

    /// Issue a request with the current token and decode a JSON response.
    pub async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.execute(method, path, body).await?;
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// `GET /api/health`; reachable means any success status.
    pub async fn health(&self) -> bool {
        match self.http.get(self.url("/health")).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "health check failed");
                false
            }
        }
    }

    async fn execute<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let token = self.auth_token();
        tracing::debug!(%method, %url, authorized = token.is_some(), "sending API request");

        let mut req = self.http.request(method.clone(), &url);
        if let Some(token) = &token {
            req = req.bearer_auth(token.expose());
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let detail = error_detail(resp).await;
        tracing::debug!(%method, %url, status = status.as_u16(), ?detail, "API request rejected");
        Err(ClientError::Api {
            status: status.as_u16(),
            detail,
        })
    }
}

/// Pull the `detail` string out of an error body, if there is one.
///
/// Structured details (e.g. validation error arrays) are not user-facing text
/// and are dropped.
async fn error_detail(resp: reqwest::Response) -> Option<String> {
    let bytes = resp.bytes().await.ok()?;
    let body: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let detail = body.get("detail")?.as_str()?.trim();
    (!detail.is_empty()).then(|| detail.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(&ClientConfig::new("http://localhost:8001/")).unwrap()
    }

    #[test]
    fn urls_are_joined_under_api_prefix() {
        let api = client();
        assert_eq!(api.url("/users/me"), "http://localhost:8001/api/users/me");
        assert_eq!(api.url("auth/login"), "http://localhost:8001/api/auth/login");
    }

    #[test]
    fn token_slot_is_shared_between_clones() {
        let api = client();
        let clone = api.clone();

        api.set_auth_token(Some(AccessToken::new("t1")));
        assert_eq!(clone.auth_token(), Some(AccessToken::new("t1")));

        clone.set_auth_token(None);
        assert_eq!(api.auth_token(), None);
    }

    #[test]
    fn swapping_tokens_overwrites_the_slot() {
        let api = client();
        api.set_auth_token(Some(AccessToken::new("old")));
        api.set_auth_token(Some(AccessToken::new("new")));
        assert_eq!(api.auth_token().unwrap().expose(), "new");
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(ApiClient::new(&ClientConfig::new("nope")).is_err());
    }
}
