//! `neemaflex-client`: the IO side of a Neemaflex session.
//!
//! - [`store`] persists the token pair between runs.
//! - [`api`] sends every request to the backend with the current bearer token.
//! - [`session`] owns the session state and keeps the other two in step.
//!
//! Navigation decisions live in `neemaflex-auth` and take a
//! [`SessionState`](neemaflex_auth::SessionState) snapshot from
//! [`SessionManager::state`].

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod store;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result, StoreError};
pub use session::{AuthOutcome, SessionManager};
pub use store::{FileTokenStore, MemoryTokenStore, StoredTokens, TokenStore};
