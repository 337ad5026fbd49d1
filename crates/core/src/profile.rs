//! Request payloads sent by the session layer.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DomainError, DomainResult};
use crate::role::RoleKind;

/// Same shape the API accepts: optional `+`, optional country `1`, 9 to 15 digits.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?1?\d{9,15}$").expect("phone pattern is valid"));

/// Minimum password length accepted by the registration endpoint.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Body of `POST /api/auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /api/auth/register`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Registration {
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub role: RoleKind,
    pub password: String,
}

impl Registration {
    /// Reject input the API is known to refuse, before any network call.
    pub fn validate(&self) -> DomainResult<()> {
        if !looks_like_email(&self.email) {
            return Err(DomainError::validation("Enter a valid email address"));
        }
        if !PHONE_PATTERN.is_match(&self.phone) {
            return Err(DomainError::validation("Invalid phone number format"));
        }
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(DomainError::validation("First and last name are required"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

impl core::fmt::Debug for Registration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("role", &self.role)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Body of `PUT /api/users/me`. Absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Map<String, Value>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn registration() -> Registration {
        Registration {
            email: "grace@example.com".to_string(),
            phone: "+254700000001".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            role: RoleKind::Customer,
            password: "correct horse".to_string(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert_eq!(registration().validate(), Ok(()));
    }

    #[test]
    fn short_password_is_rejected() {
        let reg = Registration {
            password: "short".to_string(),
            ..registration()
        };
        let err = reg.validate().unwrap_err();
        assert_eq!(err.user_message(), "Password must be at least 8 characters");
    }

    #[test]
    fn phone_must_match_api_pattern() {
        for phone in ["12345", "+25470000000a", "phone", "+1234567890123456789"] {
            let reg = Registration {
                phone: phone.to_string(),
                ..registration()
            };
            assert!(reg.validate().is_err(), "{phone} should be rejected");
        }
        for phone in ["0700000000", "+15551234567", "123456789"] {
            let reg = Registration {
                phone: phone.to_string(),
                ..registration()
            };
            assert!(reg.validate().is_ok(), "{phone} should be accepted");
        }
    }

    #[test]
    fn malformed_email_is_rejected() {
        for email in ["grace", "@example.com", "grace@example", "grace@.com"] {
            let reg = Registration {
                email: email.to_string(),
                ..registration()
            };
            assert!(reg.validate().is_err(), "{email} should be rejected");
        }
    }

    #[test]
    fn registration_serializes_role_in_wire_form() {
        let json = serde_json::to_value(registration()).unwrap();
        assert_eq!(json["role"], "customer");
    }

    #[test]
    fn debug_output_hides_passwords() {
        let login = LoginRequest::new("a@b.com", "hunter22");
        assert!(!format!("{login:?}").contains("hunter22"));
        assert!(!format!("{:?}", registration()).contains("correct horse"));
    }

    #[test]
    fn profile_update_only_sends_present_fields() {
        let update = ProfileUpdate {
            first_name: Some("Ada".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "first_name": "Ada" }));
        assert!(!update.is_empty());
        assert!(ProfileUpdate::default().is_empty());
    }

    proptest! {
        #[test]
        fn any_plausible_phone_is_accepted(phone in "\\+?[0-9]{9,15}") {
            let mut r = registration();
            r.phone = phone;
            prop_assert!(r.validate().is_ok());
        }

        #[test]
        fn short_passwords_are_always_rejected(password in ".{0,7}") {
            let mut r = registration();
            r.password = password;
            prop_assert!(r.validate().is_err());
        }
    }
}
