//! `larek-core` : storefront domain building blocks.
//!
//! This crate contains **pure domain** primitives (no IO, no event dispatch).

pub mod entity;
pub mod error;
pub mod id;
pub mod price;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::ProductId;
pub use price::Price;
pub use value_object::ValueObject;
