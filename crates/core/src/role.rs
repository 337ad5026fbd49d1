use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Role name as it travels on the wire.
///
/// Roles are kept as opaque strings at this layer so an account with a role the
/// client does not know about still deserializes; [`Role::kind`] projects it
/// onto the closed set the client actually understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const CUSTOMER: Role = Role(Cow::Borrowed("customer"));
    pub const SERVICE_PROVIDER: Role = Role(Cow::Borrowed("service_provider"));
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The known role this name denotes, if any.
    pub fn kind(&self) -> Option<RoleKind> {
        self.as_str().parse().ok()
    }

    /// Whether this role is `kind`. Unknown roles never match.
    pub fn is(&self, kind: RoleKind) -> bool {
        self.kind() == Some(kind)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RoleKind> for Role {
    fn from(kind: RoleKind) -> Self {
        Role(Cow::Borrowed(kind.as_str()))
    }
}

/// The closed set of roles an account can hold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Customer,
    ServiceProvider,
    Admin,
}

impl RoleKind {
    pub const ALL: [RoleKind; 3] = [RoleKind::Customer, RoleKind::ServiceProvider, RoleKind::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Customer => "customer",
            RoleKind::ServiceProvider => "service_provider",
            RoleKind::Admin => "admin",
        }
    }

    /// Human-readable label for badges and menus.
    pub fn display_name(&self) -> &'static str {
        match self {
            RoleKind::Customer => "Customer",
            RoleKind::ServiceProvider => "Service Provider",
            RoleKind::Admin => "Admin",
        }
    }
}

impl core::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for RoleKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(RoleKind::Customer),
            "service_provider" => Ok(RoleKind::ServiceProvider),
            "admin" => Ok(RoleKind::Admin),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}
