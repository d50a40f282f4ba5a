//! Product price value object.

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Price of a product in whole currency units, or "priceless".
///
/// The shop backend sends `null` for items that cannot be bought. Priceless
/// items count as zero in totals and are never submitted with an order.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Option<u64>);

impl Price {
    pub const PRICELESS: Price = Price(None);

    pub const fn new(amount: u64) -> Self {
        Self(Some(amount))
    }

    pub const fn amount(self) -> Option<u64> {
        self.0
    }

    pub const fn amount_or_zero(self) -> u64 {
        match self.0 {
            Some(amount) => amount,
            None => 0,
        }
    }

    pub const fn is_priceless(self) -> bool {
        self.0.is_none()
    }
}

impl From<Option<u64>> for Price {
    fn from(value: Option<u64>) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0 {
            Some(amount) => write!(f, "{amount}"),
            None => f.write_str("priceless"),
        }
    }
}

impl ValueObject for Price {}
