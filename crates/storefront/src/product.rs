use serde::{Deserialize, Serialize};

use larek_core::{Entity, Price, ProductId};

/// Catalog product, as served by the shop backend.
///
/// Immutable once loaded: the store wraps each product in an `Rc` and the
/// basket and preview share that allocation instead of copying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Image reference; absolute once the API adapter has resolved it.
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: Price,
}

impl Product {
    pub fn new(id: ProductId, title: impl Into<String>, price: Price) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            image: String::new(),
            category: String::new(),
            price,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn is_priceless(&self) -> bool {
        self.price.is_priceless()
    }

    /// Whether the product can be part of a submitted order.
    pub fn is_orderable(&self) -> bool {
        self.price.amount().is_some_and(|amount| amount > 0)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_shape_with_null_price() {
        let json = r#"{
            "id": "b06cde61-912f-4663-9751-09956c0eed67",
            "description": "Будет стоять над душой и не давать прокрастинировать.",
            "image": "/Asterisk_2.svg",
            "title": "Мамка-таймер",
            "category": "софт-скил",
            "price": null
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "b06cde61-912f-4663-9751-09956c0eed67");
        assert_eq!(product.category, "софт-скил");
        assert!(product.is_priceless());
        assert!(!product.is_orderable());
    }

    #[test]
    fn zero_price_is_not_orderable() {
        let id = ProductId::new("free").unwrap();
        assert!(!Product::new(id.clone(), "Free", Price::new(0)).is_orderable());
        assert!(Product::new(id, "Paid", Price::new(1)).is_orderable());
    }
}
