//! Application route table.
//!
//! `/`, `/login` and `/register` are public but bounce a logged-in account to
//! the dashboard. `/dashboard` is guarded and shows the role's dashboard.
//! Anything else goes back to `/`. While the session is bootstrapping every
//! route shows the loading placeholder.
//!
//! [`resolve`] answers a single navigation step; [`settle`] follows redirects to
//! the page that finally renders.

use serde::Serialize;

use crate::dispatch::{Dashboard, DispatchOutcome, dispatch};
use crate::guard::{GuardDecision, LANDING_PATH, LOGIN_PATH, guard};
use crate::session::SessionState;

pub const HOME_PATH: &str = "/";
pub const REGISTER_PATH: &str = "/register";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppRoute {
    Landing,
    Login,
    Register,
    Dashboard,
    NotFound,
}

impl AppRoute {
    /// Match a path, ignoring query string, fragment and trailing slashes.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => AppRoute::Landing,
            LOGIN_PATH => AppRoute::Login,
            REGISTER_PATH => AppRoute::Register,
            LANDING_PATH => AppRoute::Dashboard,
            _ => AppRoute::NotFound,
        }
    }
}

/// What a route renders once access is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Landing,
    Login,
    Register,
    Dashboard(Dashboard),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Navigation {
    Loading,
    Render(View),
    Redirect(&'static str),
}

impl core::fmt::Display for Navigation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Navigation::Loading => f.write_str("loading"),
            Navigation::Render(View::Landing) => f.write_str("render landing"),
            Navigation::Render(View::Login) => f.write_str("render login"),
            Navigation::Render(View::Register) => f.write_str("render register"),
            Navigation::Render(View::Dashboard(dashboard)) => write!(f, "render {dashboard}"),
            Navigation::Redirect(path) => write!(f, "redirect {path}"),
        }
    }
}

/// Resolve one navigation to `path` for the given session.
pub fn resolve(path: &str, state: &SessionState) -> Navigation {
    if state.is_loading() {
        return Navigation::Loading;
    }

    // Only an account with a dashboard to land on is bounced; an unknown role
    // stays on the public page.
    let public = |view: View| {
        if state.role_kind().is_some() {
            Navigation::Redirect(LANDING_PATH)
        } else {
            Navigation::Render(view)
        }
    };

    match AppRoute::parse(path) {
        AppRoute::Landing => public(View::Landing),
        AppRoute::Login => public(View::Login),
        AppRoute::Register => public(View::Register),
        AppRoute::Dashboard => match guard(state, None) {
            GuardDecision::Loading => Navigation::Loading,
            GuardDecision::RedirectToLogin => Navigation::Redirect(LOGIN_PATH),
            GuardDecision::RedirectToLanding => Navigation::Redirect(LANDING_PATH),
            GuardDecision::Render => match state.identity().map(|i| dispatch(&i.role)) {
                Some(DispatchOutcome::Dashboard(dashboard)) => {
                    Navigation::Render(View::Dashboard(dashboard))
                }
                Some(DispatchOutcome::RedirectToLogin) | None => Navigation::Redirect(LOGIN_PATH),
            },
        },
        AppRoute::NotFound => Navigation::Redirect(HOME_PATH),
    }
}

/// Upper bound on redirects [`settle`] follows.
pub const MAX_REDIRECTS: usize = 4;

/// Follow redirects from `path` until a page renders or the session is loading.
pub fn settle(path: &str, state: &SessionState) -> Navigation {
    let mut nav = resolve(path, state);
    for _ in 0..MAX_REDIRECTS {
        match nav {
            Navigation::Redirect(next) => nav = resolve(next, state),
            _ => break,
        }
    }
    nav
}

#[cfg(test)]
mod tests {
    use super::*;
    use neemaflex_core::Identity;
    use serde_json::json;

    fn signed_in(role: &str) -> SessionState {
        let identity: Identity = serde_json::from_value(json!({
            "id": "6f1c1a5e-2d7b-4c1e-9a0f-3b8e4d2c1a00",
            "email": "user@example.com",
            "phone": "0700000000",
            "first_name": "Test",
            "last_name": "User",
            "role": role
        }))
        .unwrap();
        SessionState::authenticated(identity)
    }

    #[test]
    fn parse_ignores_trailing_slash_and_query() {
        assert_eq!(AppRoute::parse("/login/"), AppRoute::Login);
        assert_eq!(AppRoute::parse("/dashboard?tab=orders"), AppRoute::Dashboard);
        assert_eq!(AppRoute::parse(""), AppRoute::Landing);
        assert_eq!(AppRoute::parse("/settings"), AppRoute::NotFound);
    }

    #[test]
    fn everything_waits_while_bootstrapping() {
        for path in ["/", "/login", "/register", "/dashboard", "/nope"] {
            assert_eq!(resolve(path, &SessionState::Bootstrapping), Navigation::Loading);
        }
    }

    #[test]
    fn anonymous_visitor_sees_public_pages_and_is_sent_to_login() {
        let state = SessionState::Unauthenticated;
        assert_eq!(resolve("/", &state), Navigation::Render(View::Landing));
        assert_eq!(resolve("/register", &state), Navigation::Render(View::Register));
        assert_eq!(resolve("/dashboard", &state), Navigation::Redirect("/login"));
    }

    #[test]
    fn signed_in_account_is_bounced_off_public_pages() {
        let state = signed_in("customer");
        for path in ["/", "/login", "/register"] {
            assert_eq!(resolve(path, &state), Navigation::Redirect("/dashboard"));
        }
    }

    #[test]
    fn dashboard_is_dispatched_by_role() {
        assert_eq!(
            resolve("/dashboard", &signed_in("service_provider")),
            Navigation::Render(View::Dashboard(Dashboard::ServiceProvider))
        );
        assert_eq!(
            resolve("/dashboard", &signed_in("admin")).to_string(),
            "render admin_dashboard"
        );
    }

    #[test]
    fn unknown_role_on_dashboard_goes_to_login() {
        assert_eq!(resolve("/dashboard", &signed_in("guest")), Navigation::Redirect("/login"));
    }

    #[test]
    fn unknown_role_settles_on_login_page() {
        let state = signed_in("guest");
        assert_eq!(resolve("/login", &state), Navigation::Render(View::Login));
        assert_eq!(settle("/dashboard", &state), Navigation::Render(View::Login));
    }

    #[test]
    fn every_path_settles_within_the_redirect_bound() {
        let states = [
            SessionState::Unauthenticated,
            signed_in("customer"),
            signed_in("service_provider"),
            signed_in("admin"),
            signed_in("guest"),
        ];
        for state in &states {
            for path in ["/", "/login", "/register", "/dashboard", "/nope"] {
                let mut nav = resolve(path, state);
                let mut hops = Vec::new();
                while let Navigation::Redirect(next) = nav {
                    hops.push(next);
                    assert!(hops.len() <= MAX_REDIRECTS, "{path} never settled: {hops:?}");
                    nav = resolve(next, state);
                }
                assert_eq!(settle(path, state), nav);
            }
        }
    }

    #[test]
    fn settled_dashboard_for_signed_in_customer() {
        assert_eq!(
            settle("/login", &signed_in("customer")),
            Navigation::Render(View::Dashboard(Dashboard::Customer))
        );
        assert_eq!(settle("/dashboard", &SessionState::Unauthenticated), Navigation::Render(View::Login));
    }

    #[test]
    fn unknown_paths_go_home() {
        assert_eq!(resolve("/nope", &SessionState::Unauthenticated), Navigation::Redirect("/"));
        assert_eq!(resolve("/nope", &signed_in("admin")), Navigation::Redirect("/"));
    }
}
