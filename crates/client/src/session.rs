//! Session manager: the single owner of "who is logged in".
//!
//! The manager ties the token store, the API client's authorization slot and
//! the published [`SessionState`] together. Operations that change the session
//! are serialized, and each one persists tokens, swaps the API token and
//! publishes the new state before the next operation may start.
//!
//! User-facing operations (`login`, `register`, `update_profile`) never return
//! `Err`: their failures are values carrying a message fit for display.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};

use neemaflex_auth::{AccessToken, CredentialPair, RefreshToken, SessionState};
use neemaflex_core::{Identity, LoginRequest, ProfileUpdate, Registration};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::store::{FileTokenStore, TokenStore};

pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";
pub const PROFILE_UPDATE_FAILED: &str = "Profile update failed";

const LOGIN_ENDPOINT: &str = "/auth/login";
const REGISTER_ENDPOINT: &str = "/auth/register";
const REFRESH_ENDPOINT: &str = "/auth/refresh";
const ME_ENDPOINT: &str = "/users/me";

/// Body of a successful login or registration.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: AccessToken,
    refresh_token: RefreshToken,
    user: Identity,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a RefreshToken,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: AccessToken,
}

/// Result of a user-initiated session operation.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success,
    Failure { message: String },
}

impl AuthOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        AuthOutcome::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success)
    }

    /// Display message of a failure.
    pub fn message(&self) -> Option<&str> {
        match self {
            AuthOutcome::Success => None,
            AuthOutcome::Failure { message } => Some(message),
        }
    }
}

pub struct SessionManager {
    api: ApiClient,
    store: Arc<dyn TokenStore>,
    state: watch::Sender<SessionState>,
    ops: Mutex<()>,
}

impl core::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionManager")
            .field("api_base", &self.api.api_base())
            .field("phase", &self.state.borrow().phase())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a manager in the `Bootstrapping` state. Call [`bootstrap`] next.
    ///
    /// [`bootstrap`]: SessionManager::bootstrap
    pub fn new(api: ApiClient, store: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Bootstrapping);
        Self {
            api,
            store,
            state,
            ops: Mutex::new(()),
        }
    }

    /// Manager backed by the file token store named in `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let api = ApiClient::new(config)?;
        let store = FileTokenStore::new(config.resolved_token_path()?);
        tracing::debug!(path = %store.path().display(), "using file token store");
        Ok(Self::new(api, Arc::new(store)))
    }

    /// The API client this manager keeps authorized.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Receiver that always holds the latest state and wakes on every change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Resolve persisted credentials into a session.
    ///
    /// Always leaves `Bootstrapping`. Without a persisted access token no
    /// request is made. A rejected access token gets exactly one refresh
    /// attempt; if that fails the persisted pair is cleared. Calling this again
    /// after the first resolution returns the current state unchanged.
    pub async fn bootstrap(&self) -> SessionState {
        let _ops = self.ops.lock().await;
        let loading = self.state.borrow().is_loading();
        if !loading {
            return self.state();
        }

        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "could not read persisted tokens; starting signed out");
                self.logout_locked();
                return self.state();
            }
        };

        let Some(access_token) = stored.access_token.filter(|t| !t.is_empty()) else {
            tracing::info!("no persisted session");
            self.logout_locked();
            return self.state();
        };

        self.api.set_auth_token(Some(access_token));
        match self.fetch_identity().await {
            Ok(identity) => {
                tracing::info!(user_id = %identity.id, role = %identity.role, "restored persisted session");
                self.publish(SessionState::authenticated(identity));
            }
            Err(e) => {
                tracing::warn!(error = %e, "persisted access token not accepted; refreshing");
                self.refresh_locked().await;
            }
        }

        self.state()
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let request = LoginRequest::new(email, password);
        let _ops = self.ops.lock().await;

        match self.api.post::<_, TokenResponse>(LOGIN_ENDPOINT, &request).await {
            Ok(resp) => self.establish(resp, LOGIN_FAILED),
            Err(e) => {
                tracing::warn!(error = %e, "login rejected");
                AuthOutcome::failure(e.user_message(LOGIN_FAILED))
            }
        }
    }

    pub async fn register(&self, registration: &Registration) -> AuthOutcome {
        if let Err(e) = registration.validate() {
            return AuthOutcome::failure(e.user_message());
        }

        let _ops = self.ops.lock().await;
        match self
            .api
            .post::<_, TokenResponse>(REGISTER_ENDPOINT, registration)
            .await
        {
            Ok(resp) => self.establish(resp, REGISTRATION_FAILED),
            Err(e) => {
                tracing::warn!(error = %e, "registration rejected");
                AuthOutcome::failure(e.user_message(REGISTRATION_FAILED))
            }
        }
    }

    /// End the session. Infallible and idempotent.
    pub async fn logout(&self) {
        let _ops = self.ops.lock().await;
        self.logout_locked();
    }

    /// Send a partial profile update and adopt the server's full response.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> AuthOutcome {
        let _ops = self.ops.lock().await;
        let authenticated = self.state.borrow().is_authenticated();
        if !authenticated {
            return AuthOutcome::failure(PROFILE_UPDATE_FAILED);
        }

        match self.api.put::<_, Identity>(ME_ENDPOINT, update).await {
            Ok(identity) => {
                tracing::info!(user_id = %identity.id, "profile updated");
                self.publish(SessionState::authenticated(identity));
                AuthOutcome::Success
            }
            Err(e) => {
                tracing::warn!(error = %e, "profile update rejected");
                AuthOutcome::failure(e.user_message(PROFILE_UPDATE_FAILED))
            }
        }
    }

    /// Exchange the persisted refresh token for a new access token.
    ///
    /// Makes exactly one attempt. On failure the session is closed and the
    /// persisted pair cleared.
    pub async fn refresh(&self) -> bool {
        let _ops = self.ops.lock().await;
        self.refresh_locked().await
    }

    /// Authorized request that survives one access-token expiry.
    ///
    /// On a 401 the token is refreshed once (unless another caller already
    /// swapped it) and the request is retried once. If the refresh fails the
    /// session is closed and `SessionExpired` is returned.
    pub async fn send_authorized<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if !self.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }

        let used = self.api.auth_token();
        match self.api.send(method.clone(), path, body).await {
            Err(e) if e.is_unauthorized() => {
                tracing::debug!(%method, path, "authorization rejected; renewing session");
            }
            other => return other,
        }

        {
            let _ops = self.ops.lock().await;
            let current = self.api.auth_token();
            if current.is_none() {
                return Err(ClientError::SessionExpired);
            }
            if current == used && !self.refresh_locked().await {
                return Err(ClientError::SessionExpired);
            }
        }

        self.api.send(method, path, body).await
    }

    pub async fn get_authorized<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send_authorized(Method::GET, path, None::<&()>).await
    }

    fn establish(&self, resp: TokenResponse, fallback: &str) -> AuthOutcome {
        let TokenResponse {
            access_token,
            refresh_token,
            user,
        } = resp;

        if access_token.is_empty() || refresh_token.is_empty() {
            tracing::warn!("auth response carried an empty token");
            return AuthOutcome::failure(fallback);
        }

        let pair = CredentialPair::new(access_token, refresh_token);
        if let Err(e) = self.store.save_pair(&pair) {
            tracing::error!(error = %e, "failed to persist tokens");
            return AuthOutcome::failure(fallback);
        }
        self.api.set_auth_token(Some(pair.access_token));

        tracing::info!(user_id = %user.id, role = %user.role, "session established");
        self.publish(SessionState::authenticated(user));
        AuthOutcome::Success
    }

    async fn refresh_locked(&self) -> bool {
        match self.renew_access_token().await {
            Ok(identity) => {
                tracing::info!(user_id = %identity.id, "access token refreshed");
                self.publish(SessionState::authenticated(identity));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed; signing out");
                self.logout_locked();
                false
            }
        }
    }

    async fn renew_access_token(&self) -> Result<Identity> {
        let refresh_token = self
            .store
            .load()?
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(ClientError::NotAuthenticated)?;

        let resp: RefreshResponse = self
            .api
            .post(REFRESH_ENDPOINT, &RefreshRequest {
                refresh_token: &refresh_token,
            })
            .await?;
        if resp.access_token.is_empty() {
            return Err(ClientError::Decode("refresh returned an empty access token".to_string()));
        }

        self.store.save_access_token(&resp.access_token)?;
        self.api.set_auth_token(Some(resp.access_token));
        self.fetch_identity().await
    }

    async fn fetch_identity(&self) -> Result<Identity> {
        self.api.get(ME_ENDPOINT).await
    }

    fn logout_locked(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear persisted tokens");
        }
        self.api.set_auth_token(None);
        if self.publish(SessionState::Unauthenticated) {
            tracing::info!("signed out");
        }
    }

    /// Replace the published state in one step. Returns whether it changed.
    fn publish(&self, next: SessionState) -> bool {
        let allowed = self.state.borrow().can_transition_to(next.phase());
        debug_assert!(allowed, "illegal session transition to {}", next.phase());
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }
}
