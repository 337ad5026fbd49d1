//! Role dispatcher: which dashboard an authenticated account lands on.

use serde::Serialize;

use neemaflex_core::{Role, RoleKind};

/// Dashboard identifiers, one per known role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dashboard {
    Customer,
    ServiceProvider,
    Admin,
}

impl Dashboard {
    pub fn for_role(kind: RoleKind) -> Self {
        match kind {
            RoleKind::Customer => Dashboard::Customer,
            RoleKind::ServiceProvider => Dashboard::ServiceProvider,
            RoleKind::Admin => Dashboard::Admin,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Dashboard::Customer => "customer_dashboard",
            Dashboard::ServiceProvider => "service_provider_dashboard",
            Dashboard::Admin => "admin_dashboard",
        }
    }
}

impl core::fmt::Display for Dashboard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Dashboard(Dashboard),
    /// The role is outside the known set; treat the session as unusable.
    RedirectToLogin,
}

/// Map a role to its dashboard. Unknown roles go back to login.
pub fn dispatch(role: &Role) -> DispatchOutcome {
    match role.kind() {
        Some(kind) => DispatchOutcome::Dashboard(Dashboard::for_role(kind)),
        None => DispatchOutcome::RedirectToLogin,
    }
}

/// Badge label for a role; unknown roles read as a generic "User".
pub fn role_display_name(role: &Role) -> &'static str {
    role.kind().map(|k| k.display_name()).unwrap_or("User")
}
