//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity**: two instances with the same attribute
/// values are equal, and "modifying" one means building a new one. Prices,
/// order drafts and validation maps in the storefront are value objects;
/// products are entities (see [`crate::Entity`]).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
