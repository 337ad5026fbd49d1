//! `neemaflex-core`: domain primitives shared by the Neemaflex client crates.
//!
//! This crate contains **pure domain** types (no IO, no transport): identifiers,
//! roles, the authenticated identity snapshot and the request payloads the
//! session layer sends to the remote API.

pub mod entity;
pub mod error;
pub mod id;
pub mod identity;
pub mod profile;
pub mod role;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::UserId;
pub use identity::{Identity, KycStatus};
pub use profile::{LoginRequest, ProfileUpdate, Registration};
pub use role::{Role, RoleKind};
