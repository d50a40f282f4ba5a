//! Synchronous publish/subscribe mechanics for the storefront.
//!
//! The bus knows nothing about products or orders: producers publish a named
//! payload, consumers subscribe by exact name or by pattern. See [`EventBus`]
//! for the dispatch-order contract.

pub mod bus;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod topic;

pub use bus::{EventBus, HandlerResult, Subscription, SubscriptionId};
pub use diagnostics::{CollectingSink, DiagnosticSink, HandlerFailure, TracingSink};
pub use error::BusError;
pub use event::Event;
pub use topic::Topic;
