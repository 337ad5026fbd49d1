//! Session state machine.
//!
//! ```text
//! Bootstrapping ──resolve ok──▶ Authenticated ◀──login/register/update ok──┐
//!       │                           │  ▲                                   │
//!       └──resolve fail──▶ Unauthenticated ◀──logout / refresh fail────────┘
//! ```
//!
//! `Bootstrapping` is strictly the initial state and is never re-entered.

use serde::Serialize;

use neemaflex_core::{Identity, RoleKind};

/// Who is logged in, as far as this process knows.
///
/// A single tagged value instead of an `identity` + `loading` pair, so a
/// resolved session can never carry a stale identity.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Persisted credentials have not been resolved yet.
    #[default]
    Bootstrapping,
    /// No session.
    Unauthenticated,
    /// A verified identity snapshot.
    Authenticated { identity: Identity },
}

/// Payload-free view of [`SessionState`], handy for logs and transition checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Bootstrapping,
    Unauthenticated,
    Authenticated,
}

impl core::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SessionPhase::Bootstrapping => f.write_str("bootstrapping"),
            SessionPhase::Unauthenticated => f.write_str("unauthenticated"),
            SessionPhase::Authenticated => f.write_str("authenticated"),
        }
    }
}

impl SessionState {
    pub fn authenticated(identity: Identity) -> Self {
        SessionState::Authenticated { identity }
    }

    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Bootstrapping => SessionPhase::Bootstrapping,
            SessionState::Unauthenticated => SessionPhase::Unauthenticated,
            SessionState::Authenticated { .. } => SessionPhase::Authenticated,
        }
    }

    /// True only while the initial resolution is still running.
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Bootstrapping)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated { identity } => Some(identity),
            _ => None,
        }
    }

    /// Known role of the logged-in account, if any.
    pub fn role_kind(&self) -> Option<RoleKind> {
        self.identity().and_then(Identity::role_kind)
    }

    /// Whether moving from this state to `next` is a legal transition.
    pub fn can_transition_to(&self, next: SessionPhase) -> bool {
        next != SessionPhase::Bootstrapping
    }
}
