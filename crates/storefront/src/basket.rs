//! Basket contents and the snapshot announced on `basket:updated`.

use std::rc::Rc;

use larek_core::{Price, ProductId};

use crate::product::Product;

/// Ordered set of catalog products; a product id appears at most once.
#[derive(Debug, Clone, Default)]
pub(crate) struct Basket {
    items: Vec<Rc<Product>>,
}

impl Basket {
    pub(crate) fn contains(&self, id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    /// Append `product` unless its id is already present.
    pub(crate) fn insert(&mut self, product: Rc<Product>) -> bool {
        if self.contains(&product.id) {
            return false;
        }
        self.items.push(product);
        true
    }

    pub(crate) fn remove(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        self.items.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    pub(crate) fn items(&self) -> &[Rc<Product>] {
        &self.items
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of prices; priceless items count as zero.
    pub(crate) fn total(&self) -> u64 {
        self.items.iter().map(|item| item.price.amount_or_zero()).sum()
    }

    pub(crate) fn ids(&self) -> Vec<ProductId> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }

    pub(crate) fn snapshot(&self) -> BasketSnapshot {
        let lines = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| BasketLine {
                position: index + 1,
                id: item.id.clone(),
                title: item.title.clone(),
                price: item.price,
            })
            .collect();
        BasketSnapshot {
            lines,
            total: self.total(),
        }
    }
}

/// One rendered basket row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasketLine {
    /// 1-based display position.
    pub position: usize,
    pub id: ProductId,
    pub title: String,
    pub price: Price,
}

/// Read-only copy of the basket handed to `basket:updated` subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasketSnapshot {
    pub lines: Vec<BasketLine>,
    pub total: u64,
}

impl BasketSnapshot {
    pub fn count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|line| line.id.clone()).collect()
    }
}
