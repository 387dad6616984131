//! # Order Repository
//!
//! Database operations for orders. Mirrors [`ProductRepository`] from the
//! other side of the join table, plus an additive helper for putting more
//! products on an order.
//!
//! [`ProductRepository`]: super::product::ProductRepository

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::association::{
    begin, commit, hydrate_orders, load_products_for_order, replace_products_of_order,
    require_order, requested_set,
};
use crate::error::{DbError, DbResult};
use crate::mapper::{order_from_row, related_product_from_row};
use crate::pool::LoadStrategy;
use productstore_core::validation::validate_id;
use productstore_core::{
    EntityGraph, Hydrated, NewOrder, Order, OrderId, PageRequest, Product, ProductId,
};

mod sql {
    pub const INSERT: &str = r#"
        INSERT INTO orders (user_id, created_at, updated_at)
        VALUES (?1, ?2, ?2)
        RETURNING id
    "#;

    pub const BY_ID: &str = "SELECT * FROM orders WHERE id = ?1";

    pub const BY_ID_JOINED: &str = r#"
        SELECT
            o.*,
            p.id          AS product_id,
            p.name        AS product_name,
            p.price_cents AS product_price_cents,
            p.created_at  AS product_created_at,
            p.updated_at  AS product_updated_at
        FROM orders o
        LEFT JOIN orders_products op ON op.order_id = o.id
        LEFT JOIN products p ON p.id = op.product_id
        WHERE o.id = ?1
        ORDER BY p.id
    "#;

    pub const PAGE: &str = "SELECT * FROM orders ORDER BY id LIMIT ?1 OFFSET ?2";
    pub const ALL: &str = "SELECT * FROM orders ORDER BY id";

    pub const UPDATE: &str = "UPDATE orders SET user_id = ?2, updated_at = ?3 WHERE id = ?1";
    pub const TOUCH: &str = "UPDATE orders SET updated_at = ?2 WHERE id = ?1";

    pub const DELETE: &str = "DELETE FROM orders WHERE id = ?1";
    pub const COUNT: &str = "SELECT COUNT(*) FROM orders";
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    load_strategy: LoadStrategy,
}

impl OrderRepository {
    /// Creates a new OrderRepository using the batched loader.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository {
            pool,
            load_strategy: LoadStrategy::default(),
        }
    }

    /// Selects how associations are loaded for multi-order reads.
    pub fn with_load_strategy(mut self, load_strategy: LoadStrategy) -> Self {
        self.load_strategy = load_strategy;
        self
    }

    /// Inserts a new order with no products.
    pub async fn create(&self, new: &NewOrder) -> DbResult<Order> {
        debug!(user_id = ?new.user_id, "Creating order");

        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(sql::INSERT)
            .bind(new.user_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(Order {
            id: OrderId::new(id),
            user_id: new.user_id,
            created_at: now,
            updated_at: now,
            products: Vec::new(),
        })
    }

    /// Gets an order by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Hydrated))` - Order found, products loaded
    /// * `Ok(None)` - Order not found
    pub async fn find_by_id(&self, id: OrderId) -> DbResult<Option<Hydrated<OrderId>>> {
        validate_id("order_id", id.get())?;

        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(sql::BY_ID)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let order = order_from_row(&row)?;
        hydrate_orders(&mut conn, vec![order], self.load_strategy)
            .await
            .map(Some)
    }

    /// Gets an order by its ID, failing if it doesn't exist.
    pub async fn get_by_id(&self, id: OrderId) -> DbResult<Hydrated<OrderId>> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Gets an order and its products with one LEFT JOIN query.
    pub async fn find_by_id_joined(&self, id: OrderId) -> DbResult<Option<Hydrated<OrderId>>> {
        validate_id("order_id", id.get())?;

        let rows = sqlx::query(sql::BY_ID_JOINED)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        let Some(first) = rows.first() else {
            return Ok(None);
        };

        let mut graph = EntityGraph::new();
        let owner = graph.insert_order(order_from_row(first)?);

        let mut products = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(product) = related_product_from_row(row)? {
                products.push(product);
            }
        }
        graph.attach_products(owner, products)?;

        debug!(order_id = %id, rows = rows.len(), "Loaded order with joined query");
        Ok(Some(Hydrated::new(vec![owner], graph)?))
    }

    /// Fetches one page of orders in id order, fully associated.
    pub async fn list_page(&self, page: PageRequest) -> DbResult<Hydrated<OrderId>> {
        debug!(
            page_number = page.page_number(),
            page_size = page.page_size(),
            strategy = %self.load_strategy,
            "Listing orders"
        );

        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(sql::PAGE)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *conn)
            .await?;

        let orders = rows
            .iter()
            .map(order_from_row)
            .collect::<DbResult<Vec<_>>>()?;

        hydrate_orders(&mut conn, orders, self.load_strategy).await
    }

    /// Fetches one page from raw page bounds.
    pub async fn get_page(&self, page_number: u32, page_size: u32) -> DbResult<Hydrated<OrderId>> {
        let page = PageRequest::new(page_number, page_size)?;
        self.list_page(page).await
    }

    /// Fetches every order in id order, fully associated.
    pub async fn list_all(&self) -> DbResult<Hydrated<OrderId>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(sql::ALL).fetch_all(&mut *conn).await?;

        let orders = rows
            .iter()
            .map(order_from_row)
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = orders.len(), "Listing all orders");
        hydrate_orders(&mut conn, orders, self.load_strategy).await
    }

    /// Updates an order's user and replaces its product set.
    ///
    /// `order.products` is the complete new set. Everything is written in
    /// one transaction.
    pub async fn update(&self, order: &Order) -> DbResult<Hydrated<OrderId>> {
        validate_id("order_id", order.id.get())?;
        let related = requested_set("product_id", order.products.iter().copied(), |id: ProductId| {
            id.get()
        })?;

        debug!(order_id = %order.id, products = related.len(), "Updating order");

        let mut tx = begin(&self.pool).await?;

        let result = sqlx::query(sql::UPDATE)
            .bind(order.id)
            .bind(order.user_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order.id));
        }

        replace_products_of_order(&mut tx, order.id, &related).await?;

        let stored = require_order(&mut tx, order.id).await?;
        let hydrated = hydrate_orders(&mut tx, vec![stored], self.load_strategy).await?;

        commit(tx).await?;
        Ok(hydrated)
    }

    /// Puts more products on an order, keeping the ones already there.
    ///
    /// The union of the current and the given products is written as a
    /// full replace, in the same transaction that read the current set.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - Order or one of the products doesn't exist
    pub async fn add_products(
        &self,
        id: OrderId,
        product_ids: impl IntoIterator<Item = ProductId>,
    ) -> DbResult<Hydrated<OrderId>> {
        validate_id("order_id", id.get())?;
        let mut related = requested_set("product_id", product_ids, |id: ProductId| id.get())?;

        let mut tx = begin(&self.pool).await?;
        require_order(&mut tx, id).await?;

        let current = load_products_for_order(&mut tx, id).await?;
        related.extend(current.iter().map(|p| p.id));

        debug!(order_id = %id, products = related.len(), "Adding products to order");

        replace_products_of_order(&mut tx, id, &related).await?;

        sqlx::query(sql::TOUCH)
            .bind(id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        let stored = require_order(&mut tx, id).await?;
        let hydrated = hydrate_orders(&mut tx, vec![stored], self.load_strategy).await?;

        commit(tx).await?;
        Ok(hydrated)
    }

    /// Deletes an order. Its join rows go with it.
    pub async fn delete(&self, id: OrderId) -> DbResult<()> {
        validate_id("order_id", id.get())?;

        debug!(order_id = %id, "Deleting order");

        let result = sqlx::query(sql::DELETE)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Products linked to an order, each with empty `orders`.
    ///
    /// ## Returns
    /// * `Ok(vec![])` - Order exists but has no products
    /// * `Err(DbError::NotFound)` - Order doesn't exist
    pub async fn associated_products(&self, id: OrderId) -> DbResult<Vec<Product>> {
        validate_id("order_id", id.get())?;

        let mut conn = self.pool.acquire().await?;
        require_order(&mut conn, id).await?;
        load_products_for_order(&mut conn, id).await
    }

    /// Counts total orders (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(sql::COUNT)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
