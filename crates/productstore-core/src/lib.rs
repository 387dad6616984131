//! # productstore-core: Pure Domain Logic for the Product Store
//!
//! This crate holds the domain types and the association graph rules for
//! products, orders and the many-to-many link between them. It performs no
//! I/O; the database layer (`productstore-db`) feeds it rows and asks it to
//! wire them together.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Product Store Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Serving layer (outside workspace)                │   │
//! │  │     routing, pagination params, JSON transfer objects           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 productstore-db (Database Layer)                │   │
//! │  │   row mapping, association loading, join-table synchronization  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ productstore-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   graph   │  │ pagination │  │ validation│  │   │
//! │  │   │  Product  │  │EntityGraph│  │PageRequest │  │   rules   │  │   │
//! │  │   │   Order   │  │ Hydrated  │  │            │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Link, ids)
//! - [`graph`] - Bidirectional association graph (arena)
//! - [`money`] - Integer-cents price type
//! - [`pagination`] - Page request arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use productstore_core::{EntityGraph, Order, OrderId, Product, ProductId};
//!
//! let now = Utc::now();
//! let mut graph = EntityGraph::new();
//! let widget = graph.insert_product(Product {
//!     id: ProductId::new(1),
//!     name: "Widget".to_string(),
//!     price_cents: 999,
//!     created_at: now,
//!     updated_at: now,
//!     orders: Vec::new(),
//! });
//!
//! let order = Order {
//!     id: OrderId::new(1),
//!     user_id: None,
//!     created_at: now,
//!     updated_at: now,
//!     products: Vec::new(),
//! };
//! graph.attach_orders(widget, vec![order]).unwrap();
//!
//! assert!(graph.order(OrderId::new(1)).unwrap().has_product(widget));
//! assert!(graph.is_consistent());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod graph;
pub mod money;
pub mod pagination;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use graph::{EntityGraph, GraphRoot, Hydrated};
pub use money::Money;
pub use pagination::PageRequest;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page a single read may return.
///
/// Every row on a page triggers association loading, so the cap bounds the
/// work a single request can cause.
pub const MAX_PAGE_SIZE: u32 = 1000;
