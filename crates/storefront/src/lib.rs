//! Storefront state synchronisation.
//!
//! [`StateStore`] owns the catalog, basket, preview and checkout form and
//! announces every change on an [`EventBus`](larek_events::EventBus); views
//! subscribe to the topics in [`events::topics`] and call back into the store.
//! Everything here is single-threaded and synchronous. Network access lives
//! behind [`api::LarekApi`].

pub mod api;
pub mod basket;
pub mod checkout;
pub mod config;
pub mod events;
pub mod order;
pub mod product;
pub mod store;
pub mod wiring;


pub use api::{ApiError, InMemoryApi, LarekApi, OrderConfirmation, OrderRequest};
pub use basket::{BasketLine, BasketSnapshot};
pub use checkout::{CheckoutError, load_catalog, submit_order};
pub use config::StorefrontConfig;
pub use events::{StorefrontEvent, topics};
pub use order::{FormSection, OrderDraft, OrderField, ValidationErrors};
pub use product::Product;
pub use store::StateStore;
pub use wiring::bind_inputs;
