//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Snapshots returned by the remote API are entities: two snapshots with the
/// same id describe the same account, even when every other field differs.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Whether `other` describes the same entity (ignoring all other fields).
    fn same_entity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
