//! # productstore-db: Database Layer for the Product Store
//!
//! This crate persists products, orders and the many-to-many links between
//! them. It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Product Store Data Flow                          │
//! │                                                                         │
//! │  Serving layer (get product, list page, replace order set)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  productstore-db (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │  product.rs   │    │  (embedded)  │   │   │
//! │  │   │               │    │  order.rs     │    │              │   │   │
//! │  │   │ SqlitePool    │◄───│  association  │    │ 001_init.sql │   │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘   │   │
//! │  │                                │                               │   │
//! │  │                      mapper.rs (row → entity)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  productstore-core (EntityGraph, validation, ids)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`mapper`] - Result row to entity mapping
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, order, association)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use productstore_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let page = db.products().get_page(1, 20).await?;
//! for product in page.products() {
//!     println!("{} has {} orders", product.name, product.orders.len());
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod mapper;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ErrorKind};
pub use pool::{ConfigError, Database, DbConfig, LoadStrategy};

// Repository re-exports for convenience
pub use repository::association::AssociationRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
