//! # Domain Types
//!
//! Core domain types used throughout the product store.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │    Product      │   │  orders_products │   │      Order      │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ─────────────  │      │
//! │  │  id (i64)       │◄──┤  product_id (FK) │   │  id (i64)       │      │
//! │  │  name           │   │  order_id (FK)   ├──►│  user_id        │      │
//! │  │  price_cents    │   └──────────────────┘   │  products[]     │      │
//! │  │  orders[]       │          Link            └─────────────────┘      │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Identifiers are assigned by storage on insert (SQLite `AUTOINCREMENT`),
//! so a value of a new entity is described by [`NewProduct`] / [`NewOrder`]
//! until the database hands back an id.
//!
//! Association sequences (`Product::orders`, `Order::products`) hold ids, not
//! nested values. The ids resolve through an [`EntityGraph`](crate::graph::EntityGraph)
//! which owns exactly one instance per entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Identifiers
// =============================================================================

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
        #[cfg_attr(feature = "sqlx", sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw storage identifier.
            #[inline]
            pub const fn new(raw: i64) -> Self {
                $name(raw)
            }

            /// Returns the raw storage identifier.
            #[inline]
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                $name(raw)
            }
        }
    };
}

entity_id!(
    /// Storage-assigned product identifier.
    ProductId
);

entity_id!(
    /// Storage-assigned order identifier.
    OrderId
);

entity_id!(
    /// Identifier of the user that placed an order.
    ///
    /// Users are managed outside this workspace; the id is carried as-is.
    UserId
);

// =============================================================================
// Product
// =============================================================================

/// A product that can appear on any number of orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier, assigned on insert.
    pub id: ProductId,

    /// Display name (never empty).
    pub name: String,

    /// Price in cents (smallest currency unit, never negative).
    pub price_cents: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,

    /// Orders this product appears on. Empty until associations are loaded.
    pub orders: Vec<OrderId>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether the given order is in this product's association set.
    pub fn has_order(&self, order_id: OrderId) -> bool {
        self.orders.contains(&order_id)
    }
}

/// Input for creating a product. The id is assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        NewProduct {
            name: name.into(),
            price_cents: price.cents(),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order grouping any number of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier, assigned on insert.
    pub id: OrderId,

    /// User that placed the order, if known.
    pub user_id: Option<UserId>,

    /// When the order was created.
    pub created_at: DateTime<Utc>,

    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,

    /// Products on this order. Empty until associations are loaded.
    pub products: Vec<ProductId>,
}

impl Order {
    /// Checks whether the given product is in this order's association set.
    pub fn has_product(&self, product_id: ProductId) -> bool {
        self.products.contains(&product_id)
    }
}

/// Input for creating an order. The id is assigned by storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
}

// =============================================================================
// Link
// =============================================================================

/// One row of the `orders_products` join table.
///
/// The pair is unique: a product appears on a given order at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Link {
    pub order_id: OrderId,
    pub product_id: ProductId,
}

impl Link {
    pub const fn new(order_id: OrderId, product_id: ProductId) -> Self {
        Link {
            order_id,
            product_id,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(1),
            name: "Widget".to_string(),
            price_cents: 999,
            created_at: now,
            updated_at: now,
            orders: vec![OrderId::new(3)],
        }
    }

    #[test]
    fn test_id_display_and_raw_value() {
        let id = ProductId::new(17);
        assert_eq!(id.get(), 17);
        assert_eq!(id.to_string(), "17");
        assert_eq!(OrderId::from(5), OrderId::new(5));
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&OrderId::new(9)).unwrap();
        assert_eq!(json, "9");
    }

    #[test]
    fn test_product_price_and_membership() {
        let product = sample_product();
        assert_eq!(product.price().to_string(), "$9.99");
        assert!(product.has_order(OrderId::new(3)));
        assert!(!product.has_order(OrderId::new(4)));
    }

    #[test]
    fn test_new_product_from_money() {
        let input = NewProduct::new("Widget", Money::from_cents(999));
        assert_eq!(input.price_cents, 999);
        assert_eq!(input.name, "Widget");
    }
}
