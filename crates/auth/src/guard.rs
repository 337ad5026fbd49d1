//! Route guard: decides what a protected route shows for the current session.

use serde::Serialize;

use neemaflex_core::RoleKind;

use crate::session::SessionState;

/// Login entry point.
pub const LOGIN_PATH: &str = "/login";

/// Default landing point for an authenticated account.
pub const LANDING_PATH: &str = "/dashboard";

/// Outcome of guarding a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardDecision {
    /// Session still resolving: show a neutral placeholder, decide later.
    Loading,
    /// Show the guarded content.
    Render,
    /// No session: go to [`LOGIN_PATH`].
    RedirectToLogin,
    /// Logged in, but the route wants a different role: go to [`LANDING_PATH`].
    RedirectToLanding,
}

impl GuardDecision {
    /// Target path for redirect decisions.
    pub fn redirect_path(&self) -> Option<&'static str> {
        match self {
            GuardDecision::RedirectToLogin => Some(LOGIN_PATH),
            GuardDecision::RedirectToLanding => Some(LANDING_PATH),
            GuardDecision::Loading | GuardDecision::Render => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect_path().is_some()
    }
}

/// Guard a route against the current session.
///
/// - No IO
/// - No panics
/// - Never redirects while the session is still bootstrapping
///
/// An account whose role is outside the known set never satisfies a role
/// requirement.
pub fn guard(state: &SessionState, required_role: Option<RoleKind>) -> GuardDecision {
    let identity = match state {
        SessionState::Bootstrapping => return GuardDecision::Loading,
        SessionState::Unauthenticated => return GuardDecision::RedirectToLogin,
        SessionState::Authenticated { identity } => identity,
    };

    match required_role {
        None => GuardDecision::Render,
        Some(required) if identity.role.is(required) => GuardDecision::Render,
        Some(_) => GuardDecision::RedirectToLanding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neemaflex_core::Identity;
    use proptest::prelude::*;
    use serde_json::json;

    fn identity_with_role(role: &str) -> Identity {
        serde_json::from_value(json!({
            "id": "6f1c1a5e-2d7b-4c1e-9a0f-3b8e4d2c1a00",
            "email": "user@example.com",
            "phone": "0700000000",
            "first_name": "Test",
            "last_name": "User",
            "role": role
        }))
        .unwrap()
    }

    fn required_role() -> impl Strategy<Value = Option<RoleKind>> {
        prop_oneof![
            Just(None),
            Just(Some(RoleKind::Customer)),
            Just(Some(RoleKind::ServiceProvider)),
            Just(Some(RoleKind::Admin)),
        ]
    }

    proptest! {
        #[test]
        fn bootstrapping_never_redirects(required in required_role()) {
            let decision = guard(&SessionState::Bootstrapping, required);
            prop_assert_eq!(decision, GuardDecision::Loading);
            prop_assert!(!decision.is_redirect());
        }

        #[test]
        fn unauthenticated_always_goes_to_login(required in required_role()) {
            prop_assert_eq!(
                guard(&SessionState::Unauthenticated, required),
                GuardDecision::RedirectToLogin
            );
        }

        #[test]
        fn authenticated_never_goes_to_login(
            role in "[a-z_]{1,20}",
            required in required_role(),
        ) {
            let state = SessionState::authenticated(identity_with_role(&role));
            let decision = guard(&state, required);
            prop_assert_ne!(decision, GuardDecision::RedirectToLogin);
            prop_assert_ne!(decision, GuardDecision::Loading);
        }
    }

    #[test]
    fn matching_role_renders() {
        let state = SessionState::authenticated(identity_with_role("admin"));
        assert_eq!(guard(&state, Some(RoleKind::Admin)), GuardDecision::Render);
        assert_eq!(guard(&state, None), GuardDecision::Render);
    }

    #[test]
    fn mismatched_role_goes_to_landing() {
        let state = SessionState::authenticated(identity_with_role("customer"));
        let decision = guard(&state, Some(RoleKind::Admin));
        assert_eq!(decision, GuardDecision::RedirectToLanding);
        assert_eq!(decision.redirect_path(), Some("/dashboard"));
    }

    #[test]
    fn unknown_role_never_satisfies_a_requirement() {
        let state = SessionState::authenticated(identity_with_role("guest"));
        for kind in RoleKind::ALL {
            assert_eq!(guard(&state, Some(kind)), GuardDecision::RedirectToLanding);
        }
    }
}
