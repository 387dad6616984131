//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations
//! - Paginated listing (always fully associated)
//! - Single-query joined lookup
//!
//! Every read hands back a [`Hydrated`] graph: the products asked for plus
//! every order linked to them, each order pointing back at its products.
//!
//! ## Paging
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get_page(2, 10)                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT * FROM products ORDER BY id LIMIT 10 OFFSET 10                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  products 11..20 (bare) ──► loader ──► graph ──► Hydrated (10 roots)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::association::{
    begin, commit, hydrate_products, load_orders_for_product, replace_orders_of_product,
    require_product, requested_set,
};
use crate::error::{DbError, DbResult};
use crate::mapper::{product_from_row, related_order_from_row};
use crate::pool::LoadStrategy;
use productstore_core::validation::{validate_id, validate_new_product, validate_product};
use productstore_core::{
    EntityGraph, Hydrated, NewProduct, Order, OrderId, PageRequest, Product, ProductId,
};

mod sql {
    pub const INSERT: &str = r#"
        INSERT INTO products (name, price_cents, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?3)
        RETURNING id
    "#;

    pub const BY_ID: &str = "SELECT * FROM products WHERE id = ?1";

    pub const BY_ID_JOINED: &str = r#"
        SELECT
            p.*,
            o.id         AS order_id,
            o.user_id    AS order_user_id,
            o.created_at AS order_created_at,
            o.updated_at AS order_updated_at
        FROM products p
        LEFT JOIN orders_products op ON op.product_id = p.id
        LEFT JOIN orders o ON o.id = op.order_id
        WHERE p.id = ?1
        ORDER BY o.id
    "#;

    pub const PAGE: &str = "SELECT * FROM products ORDER BY id LIMIT ?1 OFFSET ?2";
    pub const ALL: &str = "SELECT * FROM products ORDER BY id";

    pub const UPDATE: &str = r#"
        UPDATE products SET
            name = ?2,
            price_cents = ?3,
            updated_at = ?4
        WHERE id = ?1
    "#;

    pub const DELETE: &str = "DELETE FROM products WHERE id = ?1";
    pub const COUNT: &str = "SELECT COUNT(*) FROM products";
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let widget = repo.create(&NewProduct::new("Widget", "9.99".parse()?)).await?;
///
/// // Fully associated product
/// let loaded = repo.get_by_id(widget.id).await?;
/// for order in loaded.graph().orders_of(widget.id)? { ... }
///
/// // Second page of ten
/// let page = repo.get_page(2, 10).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    load_strategy: LoadStrategy,
}

impl ProductRepository {
    /// Creates a new ProductRepository using the batched loader.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository {
            pool,
            load_strategy: LoadStrategy::default(),
        }
    }

    /// Selects how associations are loaded for multi-product reads.
    pub fn with_load_strategy(mut self, load_strategy: LoadStrategy) -> Self {
        self.load_strategy = load_strategy;
        self
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Stored product with its assigned id and no orders
    /// * `Err(DbError::Validation)` - Empty name or negative price
    pub async fn create(&self, new: &NewProduct) -> DbResult<Product> {
        validate_new_product(new)?;

        debug!(name = %new.name, price_cents = new.price_cents, "Creating product");

        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(sql::INSERT)
            .bind(&new.name)
            .bind(new.price_cents)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(Product {
            id: ProductId::new(id),
            name: new.name.clone(),
            price_cents: new.price_cents,
            created_at: now,
            updated_at: now,
            orders: Vec::new(),
        })
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Hydrated))` - Product found, orders loaded
    /// * `Ok(None)` - Product not found
    pub async fn find_by_id(&self, id: ProductId) -> DbResult<Option<Hydrated<ProductId>>> {
        validate_id("product_id", id.get())?;

        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(sql::BY_ID)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let product = product_from_row(&row)?;
        hydrate_products(&mut conn, vec![product], self.load_strategy)
            .await
            .map(Some)
    }

    /// Gets a product by its ID, failing if it doesn't exist.
    pub async fn get_by_id(&self, id: ProductId) -> DbResult<Hydrated<ProductId>> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Gets a product and its orders with one LEFT JOIN query.
    ///
    /// Every row repeats the product's columns; all of them resolve to the
    /// same graph instance. A product without orders comes back as a single
    /// row with a null order side.
    pub async fn find_by_id_joined(&self, id: ProductId) -> DbResult<Option<Hydrated<ProductId>>> {
        validate_id("product_id", id.get())?;

        let rows = sqlx::query(sql::BY_ID_JOINED)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        let Some(first) = rows.first() else {
            return Ok(None);
        };

        let mut graph = EntityGraph::new();
        let owner = graph.insert_product(product_from_row(first)?);

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(order) = related_order_from_row(row)? {
                orders.push(order);
            }
        }
        graph.attach_orders(owner, orders)?;

        debug!(product_id = %id, rows = rows.len(), "Loaded product with joined query");
        Ok(Some(Hydrated::new(vec![owner], graph)?))
    }

    /// Fetches one page of products in id order, fully associated.
    pub async fn list_page(&self, page: PageRequest) -> DbResult<Hydrated<ProductId>> {
        debug!(
            page_number = page.page_number(),
            page_size = page.page_size(),
            strategy = %self.load_strategy,
            "Listing products"
        );

        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(sql::PAGE)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *conn)
            .await?;

        let products = rows
            .iter()
            .map(product_from_row)
            .collect::<DbResult<Vec<_>>>()?;

        hydrate_products(&mut conn, products, self.load_strategy).await
    }

    /// Fetches one page from raw page bounds.
    ///
    /// ## Errors
    /// * `DbError::Validation` - `page_number` or `page_size` below 1,
    ///   or `page_size` above the maximum
    pub async fn get_page(&self, page_number: u32, page_size: u32) -> DbResult<Hydrated<ProductId>> {
        let page = PageRequest::new(page_number, page_size)?;
        self.list_page(page).await
    }

    /// Fetches every product in id order, fully associated.
    pub async fn list_all(&self) -> DbResult<Hydrated<ProductId>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(sql::ALL).fetch_all(&mut *conn).await?;

        let products = rows
            .iter()
            .map(product_from_row)
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = products.len(), "Listing all products");
        hydrate_products(&mut conn, products, self.load_strategy).await
    }

    /// Updates a product's fields and replaces its order set.
    ///
    /// `product.orders` is the complete new set; it goes through the same
    /// full-replace path as a synchronize. Scalars and links are written in
    /// one transaction, and the returned graph is read inside it.
    ///
    /// ## Errors
    /// * `DbError::Validation` - Empty name or negative price
    /// * `DbError::NotFound` - Product or one of its orders doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<Hydrated<ProductId>> {
        validate_product(product)?;
        let related = requested_set("order_id", product.orders.iter().copied(), |id: OrderId| {
            id.get()
        })?;

        debug!(product_id = %product.id, orders = related.len(), "Updating product");

        let mut tx = begin(&self.pool).await?;

        let result = sqlx::query(sql::UPDATE)
            .bind(product.id)
            .bind(&product.name)
            .bind(product.price_cents)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id));
        }

        replace_orders_of_product(&mut tx, product.id, &related).await?;

        let stored = require_product(&mut tx, product.id).await?;
        let hydrated = hydrate_products(&mut tx, vec![stored], self.load_strategy).await?;

        commit(tx).await?;
        Ok(hydrated)
    }

    /// Deletes a product. Its join rows go with it.
    ///
    /// ## Returns
    /// * `Ok(())` - Product deleted
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn delete(&self, id: ProductId) -> DbResult<()> {
        validate_id("product_id", id.get())?;

        debug!(product_id = %id, "Deleting product");

        let result = sqlx::query(sql::DELETE)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Orders linked to a product, each with empty `products`.
    ///
    /// ## Returns
    /// * `Ok(vec![])` - Product exists but has no orders
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn associated_orders(&self, id: ProductId) -> DbResult<Vec<Order>> {
        validate_id("product_id", id.get())?;

        let mut conn = self.pool.acquire().await?;
        require_product(&mut conn, id).await?;
        load_orders_for_product(&mut conn, id).await
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(sql::COUNT)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pool::{Database, DbConfig};
    use productstore_core::Money;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn widget() -> NewProduct {
        NewProduct::new("Widget", Money::from_cents(999))
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_empty_orders() {
        let db = setup().await;

        let first = db.products().create(&widget()).await.unwrap();
        let second = db.products().create(&widget()).await.unwrap();

        assert_eq!(first.id, ProductId::new(1));
        assert_eq!(second.id, ProductId::new(2));
        assert!(first.orders.is_empty());
        assert_eq!(db.products().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let db = setup().await;

        let err = db
            .products()
            .create(&NewProduct::new("  ", Money::from_cents(100)))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_missing_product() {
        let db = setup().await;

        assert!(db.products().find_by_id(ProductId::new(42)).await.unwrap().is_none());
        assert!(db
            .products()
            .get_by_id(ProductId::new(42))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_joined_lookup_without_orders() {
        let db = setup().await;
        let created = db.products().create(&widget()).await.unwrap();

        let loaded = db
            .products()
            .find_by_id_joined(created.id)
            .await
            .unwrap()
            .unwrap();

        let product = loaded.first().unwrap();
        assert_eq!(product.name, "Widget");
        assert!(product.orders.is_empty());
        assert_eq!(loaded.graph().order_count(), 0);
    }

    #[tokio::test]
    async fn test_update_fields() {
        let db = setup().await;
        let mut product = db.products().create(&widget()).await.unwrap();
        product.name = "Gadget".to_string();
        product.price_cents = 1250;

        let updated = db.products().update(&product).await.unwrap();

        let stored = updated.first().unwrap();
        assert_eq!(stored.name, "Gadget");
        assert_eq!(stored.price_cents, 1250);
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = setup().await;
        let mut product = db.products().create(&widget()).await.unwrap();
        product.id = ProductId::new(99);

        let err = db.products().update(&product).await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = setup().await;
        let product = db.products().create(&widget()).await.unwrap();

        db.products().delete(product.id).await.unwrap();

        assert!(db.products().find_by_id(product.id).await.unwrap().is_none());
        assert!(db.products().delete(product.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_associated_orders_of_missing_product() {
        let db = setup().await;

        let err = db
            .products()
            .associated_orders(ProductId::new(5))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_page_bounds_are_validated() {
        let db = setup().await;

        let err = db.products().get_page(0, 10).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = db.products().get_page(1, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_page_beyond_end_is_empty() {
        let db = setup().await;
        db.products().create(&widget()).await.unwrap();

        let page = db.products().get_page(3, 10).await.unwrap();

        assert!(page.is_empty());
    }
}
