//! Flows that span the store and the backend.
//!
//! These are the compositions the page wiring performs: load the catalog on
//! start, and turn a complete draft plus basket into a placed order.

use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::{ApiError, LarekApi, OrderConfirmation, OrderRequest};
use crate::events::StorefrontEvent;
use crate::order::ValidationErrors;
use crate::store::StateStore;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("order form is incomplete ({} field(s) invalid)", .0.len())]
    Invalid(ValidationErrors),

    #[error("basket has nothing that can be ordered")]
    Empty,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl OrderRequest {
    /// Build the submission body from the store's current state.
    ///
    /// Only items with a price above zero are submitted; the total is the
    /// basket total, to which the excluded items contribute nothing.
    pub fn from_store(store: &StateStore) -> Self {
        let draft = store.order_draft();
        Self {
            payment: draft.payment().to_string(),
            email: draft.email().to_string(),
            phone: draft.phone().to_string(),
            address: draft.address().to_string(),
            total: store.basket_total(),
            items: store
                .orderable_basket_items()
                .iter()
                .map(|item| item.id.clone())
                .collect(),
        }
    }
}

/// Fetch the catalog and hand it to the store.
///
/// On failure the current catalog is left as it is.
pub fn load_catalog(store: &StateStore, api: &dyn LarekApi) -> Result<usize, ApiError> {
    let products = api.fetch_catalog().map_err(|err| {
        error!(error = %err, "failed to load catalog");
        err
    })?;
    let count = products.len();
    store.replace_catalog(products);
    info!(products = count, "catalog loaded");
    Ok(count)
}

/// Validate, submit, and on success reset the session's checkout state.
///
/// After a placed order the basket, the draft and the error map are empty and
/// `order:placed` has been announced with the confirmation. Any failure
/// leaves the store untouched apart from the validation pass itself.
pub fn submit_order(store: &StateStore, api: &dyn LarekApi) -> Result<OrderConfirmation, CheckoutError> {
    if !store.validate_order() {
        return Err(CheckoutError::Invalid(store.validation_errors()));
    }

    let request = OrderRequest::from_store(store);
    if request.items.is_empty() {
        warn!(basket = store.basket_count(), "refusing order without orderable items");
        return Err(CheckoutError::Empty);
    }

    let confirmation = api.place_order(&request).map_err(|err| {
        error!(error = %err, items = request.items.len(), "order placement failed");
        err
    })?;
    info!(order_id = %confirmation.id, total = confirmation.total, "order placed");

    store.clear_basket();
    store.clear_order();
    store.reset_validation();
    store
        .bus()
        .emit(&StorefrontEvent::OrderPlaced(confirmation.clone()));

    Ok(confirmation)
}
