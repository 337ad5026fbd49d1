//! `neemaflex-auth`: pure session/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models the
//! credential pair, the session state machine and the navigation decisions that
//! depend on it. Everything here is synchronous and side-effect free.

pub mod dispatch;
pub mod guard;
pub mod routes;
pub mod session;
pub mod token;

pub use dispatch::{Dashboard, DispatchOutcome, dispatch, role_display_name};
pub use guard::{GuardDecision, LANDING_PATH, LOGIN_PATH, guard};
pub use routes::{AppRoute, Navigation, View, resolve, settle};
pub use session::{SessionPhase, SessionState};
pub use token::{AccessToken, CredentialPair, RefreshToken};
