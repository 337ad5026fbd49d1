//! Client configuration, resolved once at startup.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::{ClientError, Result};

pub const BACKEND_URL_ENV: &str = "NEEMAFLEX_BACKEND_URL";
pub const TOKEN_PATH_ENV: &str = "NEEMAFLEX_TOKEN_PATH";
pub const REQUEST_TIMEOUT_ENV: &str = "NEEMAFLEX_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Backend origin, without the `/api` prefix.
    pub backend_url: String,

    /// Where the file-backed token store lives. `None` means the default
    /// location under the user's data directory.
    #[serde(default)]
    pub token_path: Option<PathBuf>,

    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl ClientConfig {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            token_path: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Read configuration from the process environment.
    ///
    /// The result is not validated, so command-line overrides can still be
    /// applied; call [`validate`](Self::validate) once they are.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend_url = lookup(BACKEND_URL_ENV).unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let token_path = lookup(TOKEN_PATH_ENV).map(PathBuf::from);

        let request_timeout_secs = match lookup(REQUEST_TIMEOUT_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ClientError::Config(format!("{REQUEST_TIMEOUT_ENV} must be a whole number of seconds, got '{raw}'"))
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            backend_url,
            token_path,
            request_timeout_secs,
        })
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.backend_url)
            .map_err(|e| ClientError::Config(format!("invalid backend url '{}': {e}", self.backend_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "backend url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ClientError::Config("request timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Base of every API path: `<backend_url>/api`.
    pub fn api_base(&self) -> String {
        format!("{}/api", self.backend_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured token file, or `<data dir>/neemaflex/session.json`.
    pub fn resolved_token_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.token_path {
            return Ok(path.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("neemaflex").join("session.json"))
            .ok_or_else(|| {
                ClientError::Config(format!(
                    "no local data directory available; set {TOKEN_PATH_ENV}"
                ))
            })
    }
}
