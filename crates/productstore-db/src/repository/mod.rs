//! # Repository Module
//!
//! Database repository implementations for the product store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Owns What                                        │
//! │                                                                         │
//! │  Serving layer                                                          │
//! │       │                                                                 │
//! │       │  db.products().get_page(1, 20)                                  │
//! │       │  db.associations().synchronize_product(&mut graph, id, set)     │
//! │       ▼                                                                 │
//! │  ProductRepository / OrderRepository                                    │
//! │  ├── create, find/get_by_id, find_by_id_joined                          │
//! │  ├── list_page, get_page, list_all                                      │
//! │  └── update, delete, count                                              │
//! │       │                                                                 │
//! │       │  loader + graph builder + synchronizer                          │
//! │       ▼                                                                 │
//! │  association (orders_products)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Product CRUD and paging
//! - [`OrderRepository`] - Order CRUD, paging and additive product helper
//! - [`AssociationRepository`] - Join-table reads and full-replace writes
//!
//! [`ProductRepository`]: product::ProductRepository
//! [`OrderRepository`]: order::OrderRepository
//! [`AssociationRepository`]: association::AssociationRepository

pub mod association;
pub mod order;
pub mod product;
