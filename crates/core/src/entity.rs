//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Collections keyed by identity (basket membership, preview lookup) compare
/// entities through [`Entity::id`], never by value.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
