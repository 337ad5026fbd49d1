//! Opaque bearer credentials.
//!
//! Token values never appear in `Debug` output so they cannot leak through
//! logs or panic messages; use `expose()` at the point a header is built.

use serde::{Deserialize, Serialize};

/// Short-lived bearer token attached to authenticated requests.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

/// Long-lived token exchanged for a new [`AccessToken`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

macro_rules! impl_secret_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// The raw token value.
            pub fn expose(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl core::fmt::Debug for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!($name, "(<redacted>)"))
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

impl_secret_newtype!(AccessToken, "AccessToken");
impl_secret_newtype!(RefreshToken, "RefreshToken");

impl AccessToken {
    /// Value of the `Authorization` header for this token.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

/// The access/refresh pair issued by login and registration.
///
/// The pair is persisted and cleared as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

impl CredentialPair {
    pub fn new(access_token: AccessToken, refresh_token: RefreshToken) -> Self {
        Self {
            access_token,
            refresh_token,
        }
    }
}
