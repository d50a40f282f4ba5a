//! Topic catalog and the message type carried by the storefront bus.
//!
//! Store announcements and view intents share one bus, so they share one
//! message enum. Each variant knows the topic it is published under.

use std::rc::Rc;

use larek_core::ProductId;
use larek_events::Event;

use crate::api::OrderConfirmation;
use crate::basket::BasketSnapshot;
use crate::order::{OrderDraft, OrderField, ValidationErrors};
use crate::product::Product;

/// Exact, case-sensitive topic names.
pub mod topics {
    pub const CATALOG_UPDATED: &str = "catalog:updated";
    pub const PREVIEW_CHANGED: &str = "preview:changed";
    pub const BASKET_UPDATED: &str = "basket:updated";
    pub const ORDER_READY: &str = "order:ready";
    pub const FORM_ERRORS_CHANGED: &str = "formErrors:changed";
    pub const ORDER_PLACED: &str = "order:placed";

    pub const CARD_SELECT: &str = "card:select";
    pub const BASKET_TOGGLE: &str = "basket:toggle";
    pub const BASKET_REMOVE: &str = "basket:remove";

    /// Matches every `*.<field>:change` topic a checkout form publishes.
    pub const FIELD_CHANGE_PATTERN: &str = r"^(order|contacts)\.(address|payment|email|phone):change$";
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorefrontEvent {
    /// The whole catalog, in display order.
    CatalogUpdated(Vec<Rc<Product>>),
    /// The resolved preview; `None` when the id was unknown.
    PreviewChanged(Option<Rc<Product>>),
    BasketUpdated(BasketSnapshot),
    /// Every field is filled in; checkout may proceed.
    OrderReady(OrderDraft),
    FormErrorsChanged(ValidationErrors),
    OrderPlaced(OrderConfirmation),

    /// A form input changed.
    FieldChanged { field: OrderField, value: String },
    /// A catalog card was clicked.
    ProductSelected(ProductId),
    /// The preview's add/remove button was pressed.
    BasketToggled(ProductId),
    /// A basket row's delete button was pressed.
    BasketRemoved(ProductId),
}

impl StorefrontEvent {
    pub fn field_changed(field: OrderField, value: impl Into<String>) -> Self {
        Self::FieldChanged {
            field,
            value: value.into(),
        }
    }
}

impl Event for StorefrontEvent {
    fn topic(&self) -> &'static str {
        match self {
            StorefrontEvent::CatalogUpdated(_) => topics::CATALOG_UPDATED,
            StorefrontEvent::PreviewChanged(_) => topics::PREVIEW_CHANGED,
            StorefrontEvent::BasketUpdated(_) => topics::BASKET_UPDATED,
            StorefrontEvent::OrderReady(_) => topics::ORDER_READY,
            StorefrontEvent::FormErrorsChanged(_) => topics::FORM_ERRORS_CHANGED,
            StorefrontEvent::OrderPlaced(_) => topics::ORDER_PLACED,
            StorefrontEvent::FieldChanged { field, .. } => field.change_topic(),
            StorefrontEvent::ProductSelected(_) => topics::CARD_SELECT,
            StorefrontEvent::BasketToggled(_) => topics::BASKET_TOGGLE,
            StorefrontEvent::BasketRemoved(_) => topics::BASKET_REMOVE,
        }
    }
}
