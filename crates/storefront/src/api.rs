//! Contract with the shop backend.
//!
//! The store never talks to the network. A transport adapter implements
//! [`LarekApi`], awaits the backend, and feeds the results into the store
//! (see [`crate::checkout`]). This module owns the wire shapes and the JSON
//! decoding shared by every adapter, plus an in-process implementation.

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use larek_core::ProductId;

use crate::product::Product;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport or HTTP-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The backend understood the request and refused it.
    #[error("rejected by server: {0}")]
    Validation(String),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Blocking view of the backend.
pub trait LarekApi {
    fn fetch_catalog(&self) -> Result<Vec<Product>, ApiError>;

    fn fetch_product(&self, id: &ProductId) -> Result<Product, ApiError>;

    fn place_order(&self, order: &OrderRequest) -> Result<OrderConfirmation, ApiError>;
}

/// Envelope of list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiListResponse<T> {
    pub total: u64,
    pub items: Vec<T>,
}

/// Body of `POST /order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub payment: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub total: u64,
    pub items: Vec<ProductId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub id: String,
    pub total: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OrderResponse {
    Placed(OrderConfirmation),
    Refused { error: String },
}

/// Decode `GET /product/` and make image references absolute.
pub fn decode_product_list(json: &str, cdn_url: &str) -> Result<Vec<Product>, ApiError> {
    let list: ApiListResponse<Product> = serde_json::from_str(json)?;
    Ok(list
        .items
        .into_iter()
        .map(|product| with_cdn(product, cdn_url))
        .collect())
}

/// Decode `GET /product/{id}` and make the image reference absolute.
pub fn decode_product(json: &str, cdn_url: &str) -> Result<Product, ApiError> {
    let product: Product = serde_json::from_str(json)?;
    Ok(with_cdn(product, cdn_url))
}

/// Decode the `POST /order` response; `{"error": ...}` becomes
/// [`ApiError::Validation`].
pub fn decode_order_response(json: &str) -> Result<OrderConfirmation, ApiError> {
    match serde_json::from_str::<OrderResponse>(json)? {
        OrderResponse::Placed(confirmation) => Ok(confirmation),
        OrderResponse::Refused { error } => Err(ApiError::Validation(error)),
    }
}

fn with_cdn(mut product: Product, cdn_url: &str) -> Product {
    product.image = format!("{}{}", cdn_url.trim_end_matches('/'), product.image);
    product
}

/// In-process backend: serves a fixed catalog and checks orders the way the
/// real one does (known, priced items; matching total).
#[derive(Debug, Default)]
pub struct InMemoryApi {
    catalog: Vec<Product>,
    orders: RefCell<Vec<OrderRequest>>,
    next_failure: RefCell<Option<ApiError>>,
    next_order: Cell<u64>,
}

impl InMemoryApi {
    pub fn new(catalog: Vec<Product>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: ApiError) {
        *self.next_failure.borrow_mut() = Some(error);
    }

    /// Orders accepted so far.
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.borrow().clone()
    }

    fn take_failure(&self) -> Result<(), ApiError> {
        match self.next_failure.borrow_mut().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn check_order(&self, order: &OrderRequest) -> Result<(), ApiError> {
        if order.items.is_empty() {
            return Err(ApiError::Validation("no items in order".to_string()));
        }
        let mut total = 0;
        for id in &order.items {
            let product = self
                .catalog
                .iter()
                .find(|p| &p.id == id)
                .ok_or_else(|| ApiError::Validation(format!("item {id} not found")))?;
            let price = product
                .price
                .amount()
                .ok_or_else(|| ApiError::Validation(format!("item {id} is not for sale")))?;
            total += price;
        }
        if total != order.total {
            return Err(ApiError::Validation("total mismatch".to_string()));
        }
        Ok(())
    }
}

impl LarekApi for InMemoryApi {
    fn fetch_catalog(&self) -> Result<Vec<Product>, ApiError> {
        self.take_failure()?;
        Ok(self.catalog.clone())
    }

    fn fetch_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.take_failure()?;
        self.catalog
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| ApiError::Validation("NotFound".to_string()))
    }

    fn place_order(&self, order: &OrderRequest) -> Result<OrderConfirmation, ApiError> {
        self.take_failure()?;
        self.check_order(order)?;

        let n = self.next_order.get() + 1;
        self.next_order.set(n);
        self.orders.borrow_mut().push(order.clone());
        Ok(OrderConfirmation {
            id: format!("order-{n}"),
            total: order.total,
        })
    }
}
