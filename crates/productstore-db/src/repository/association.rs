//! # Association Repository
//!
//! Everything that touches the `orders_products` join table: loading the
//! related side of an entity, wiring loaded rows into an [`EntityGraph`],
//! and replacing an entity's association set.
//!
//! ## Read Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  base query ──► Row Mapper ──► bare entities (associations = [])        │
//! │                                     │                                   │
//! │                                     ▼                                   │
//! │                      Association Loader (per entity or batched)         │
//! │                                     │                                   │
//! │                                     ▼                                   │
//! │                 EntityGraph::attach_orders / attach_products            │
//! │                   (one shared instance per id, both sides linked)       │
//! │                                     │                                   │
//! │                                     ▼                                   │
//! │                        Hydrated { roots, graph }                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads never write anything they load.
//!
//! ## Write Path (full replace)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   SINGLE TRANSACTION                                    │
//! │                                                                         │
//! │  1. owner exists?                      no  → NotFound (nothing written) │
//! │  2. every related id exists?           no  → NotFound (nothing written) │
//! │  3. DELETE FROM orders_products WHERE owner = ?                         │
//! │  4. INSERT INTO orders_products VALUES (owner, r1), (owner, r2), ...    │
//! │                                                                         │
//! │  COMMIT ← delete and insert land together or not at all                 │
//! │                                                                         │
//! │  5. in-memory graph: old back-references dropped, new ones added        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Duplicate ids in the requested set collapse to one join row.
//!
//! Write transactions start with `BEGIN IMMEDIATE`, which takes SQLite's
//! write lock before the existence checks read anything. Concurrent
//! synchronizes of the same owner therefore queue on the lock (up to the
//! busy timeout) instead of failing when a deferred read upgrades to a
//! write. The last one to commit wins.

use std::collections::{BTreeMap, BTreeSet};

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::mapper::{
    order_from_columns, order_from_row, owner_order_id, owner_product_id, product_from_columns,
    product_from_row, RELATED_ORDER_COLUMNS, RELATED_PRODUCT_COLUMNS,
};
use crate::pool::LoadStrategy;
use productstore_core::validation::validate_id;
use productstore_core::{EntityGraph, Hydrated, Link, Order, OrderId, Product, ProductId};

// =============================================================================
// SQL
// =============================================================================

mod sql {
    pub const ORDERS_FOR_PRODUCT: &str = r#"
        SELECT
            o.id         AS order_id,
            o.user_id    AS order_user_id,
            o.created_at AS order_created_at,
            o.updated_at AS order_updated_at
        FROM orders o
        JOIN orders_products op ON o.id = op.order_id
        WHERE op.product_id = ?1
        ORDER BY o.id
    "#;

    pub const PRODUCTS_FOR_ORDER: &str = r#"
        SELECT
            p.id          AS product_id,
            p.name        AS product_name,
            p.price_cents AS product_price_cents,
            p.created_at  AS product_created_at,
            p.updated_at  AS product_updated_at
        FROM products p
        JOIN orders_products op ON p.id = op.product_id
        WHERE op.order_id = ?1
        ORDER BY p.id
    "#;

    pub const ORDERS_FOR_PRODUCTS_PREFIX: &str = r#"
        SELECT
            op.product_id AS owner_id,
            o.id          AS order_id,
            o.user_id     AS order_user_id,
            o.created_at  AS order_created_at,
            o.updated_at  AS order_updated_at
        FROM orders_products op
        JOIN orders o ON o.id = op.order_id
        WHERE op.product_id IN ("#;

    pub const PRODUCTS_FOR_ORDERS_PREFIX: &str = r#"
        SELECT
            op.order_id   AS owner_id,
            p.id          AS product_id,
            p.name        AS product_name,
            p.price_cents AS product_price_cents,
            p.created_at  AS product_created_at,
            p.updated_at  AS product_updated_at
        FROM orders_products op
        JOIN products p ON p.id = op.product_id
        WHERE op.order_id IN ("#;

    pub const PRODUCTS_BY_IDS_PREFIX: &str = "SELECT * FROM products WHERE id IN (";
    pub const ORDERS_BY_IDS_PREFIX: &str = "SELECT * FROM orders WHERE id IN (";

    pub const PRODUCT_BY_ID: &str = "SELECT * FROM products WHERE id = ?1";
    pub const ORDER_BY_ID: &str = "SELECT * FROM orders WHERE id = ?1";

    pub const DELETE_LINKS_OF_PRODUCT: &str = "DELETE FROM orders_products WHERE product_id = ?1";
    pub const DELETE_LINKS_OF_ORDER: &str = "DELETE FROM orders_products WHERE order_id = ?1";
    pub const INSERT_LINKS_PREFIX: &str = "INSERT INTO orders_products (order_id, product_id) ";

    pub const ALL_LINKS: &str =
        "SELECT order_id, product_id FROM orders_products ORDER BY order_id, product_id";
    pub const LINKS_OF_PRODUCT: &str =
        "SELECT order_id, product_id FROM orders_products WHERE product_id = ?1 ORDER BY order_id";
    pub const LINKS_OF_ORDER: &str =
        "SELECT order_id, product_id FROM orders_products WHERE order_id = ?1 ORDER BY product_id";
    pub const COUNT_LINKS: &str = "SELECT COUNT(*) FROM orders_products";
}

/// Ids bound per statement. SQLite caps bind parameters per statement, and
/// an insert binds two per row.
const BIND_CHUNK: usize = 400;

// =============================================================================
// Association Loader
// =============================================================================

/// Loads the orders linked to one product.
///
/// Returned orders carry empty `products`; wiring them back to the product
/// is the graph's job. No rows is not an error.
pub(crate) async fn load_orders_for_product(
    conn: &mut SqliteConnection,
    product_id: ProductId,
) -> DbResult<Vec<Order>> {
    let rows = sqlx::query(sql::ORDERS_FOR_PRODUCT)
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| order_from_columns(row, &RELATED_ORDER_COLUMNS))
        .collect()
}

/// Loads the products linked to one order.
pub(crate) async fn load_products_for_order(
    conn: &mut SqliteConnection,
    order_id: OrderId,
) -> DbResult<Vec<Product>> {
    let rows = sqlx::query(sql::PRODUCTS_FOR_ORDER)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| product_from_columns(row, &RELATED_PRODUCT_COLUMNS))
        .collect()
}

/// Loads the orders of many products with one query per chunk of owners.
///
/// Pairs come back grouped by owner, orders ascending within each owner,
/// which is the same sequence the per-entity loader yields.
pub(crate) async fn load_orders_for_products(
    conn: &mut SqliteConnection,
    product_ids: &[ProductId],
) -> DbResult<Vec<(ProductId, Order)>> {
    let mut pairs = Vec::new();

    for chunk in product_ids.chunks(BIND_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new(sql::ORDERS_FOR_PRODUCTS_PREFIX);
        let mut ids = qb.separated(", ");
        for id in chunk {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY op.product_id, o.id");

        let rows = qb.build().fetch_all(&mut *conn).await?;
        for row in &rows {
            let owner = owner_product_id(row)?;
            let order = order_from_columns(row, &RELATED_ORDER_COLUMNS)?;
            pairs.push((owner, order));
        }
    }

    Ok(pairs)
}

/// Loads the products of many orders with one query per chunk of owners.
pub(crate) async fn load_products_for_orders(
    conn: &mut SqliteConnection,
    order_ids: &[OrderId],
) -> DbResult<Vec<(OrderId, Product)>> {
    let mut pairs = Vec::new();

    for chunk in order_ids.chunks(BIND_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new(sql::PRODUCTS_FOR_ORDERS_PREFIX);
        let mut ids = qb.separated(", ");
        for id in chunk {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY op.order_id, p.id");

        let rows = qb.build().fetch_all(&mut *conn).await?;
        for row in &rows {
            let owner = owner_order_id(row)?;
            let product = product_from_columns(row, &RELATED_PRODUCT_COLUMNS)?;
            pairs.push((owner, product));
        }
    }

    Ok(pairs)
}

// =============================================================================
// Hydration (loader + graph builder)
// =============================================================================

/// Turns bare products into fully associated roots of a fresh graph.
///
/// Each product is loaded exactly once per call, so the graph builder never
/// sees the same owner twice.
pub(crate) async fn hydrate_products(
    conn: &mut SqliteConnection,
    products: Vec<Product>,
    strategy: LoadStrategy,
) -> DbResult<Hydrated<ProductId>> {
    let mut graph = EntityGraph::new();
    let roots: Vec<ProductId> = products
        .into_iter()
        .map(|p| graph.insert_product(p))
        .collect();

    match strategy {
        LoadStrategy::PerEntity => {
            for owner in &roots {
                let orders = load_orders_for_product(conn, *owner).await?;
                graph.attach_orders(*owner, orders)?;
            }
        }
        LoadStrategy::Batched => {
            for (owner, order) in load_orders_for_products(conn, &roots).await? {
                graph.attach_orders(owner, [order])?;
            }
        }
    }

    debug!(
        roots = roots.len(),
        orders = graph.order_count(),
        strategy = %strategy,
        "Hydrated products"
    );
    Ok(Hydrated::new(roots, graph)?)
}

/// Turns bare orders into fully associated roots of a fresh graph.
pub(crate) async fn hydrate_orders(
    conn: &mut SqliteConnection,
    orders: Vec<Order>,
    strategy: LoadStrategy,
) -> DbResult<Hydrated<OrderId>> {
    let mut graph = EntityGraph::new();
    let roots: Vec<OrderId> = orders.into_iter().map(|o| graph.insert_order(o)).collect();

    match strategy {
        LoadStrategy::PerEntity => {
            for owner in &roots {
                let products = load_products_for_order(conn, *owner).await?;
                graph.attach_products(*owner, products)?;
            }
        }
        LoadStrategy::Batched => {
            for (owner, product) in load_products_for_orders(conn, &roots).await? {
                graph.attach_products(owner, [product])?;
            }
        }
    }

    debug!(
        roots = roots.len(),
        products = graph.product_count(),
        strategy = %strategy,
        "Hydrated orders"
    );
    Ok(Hydrated::new(roots, graph)?)
}

// =============================================================================
// Join-Table Synchronizer
// =============================================================================

/// Validates and collapses a requested id set.
pub(crate) fn requested_set<I: Ord + Copy>(
    field: &str,
    ids: impl IntoIterator<Item = I>,
    raw: impl Fn(I) -> i64,
) -> DbResult<BTreeSet<I>> {
    let set: BTreeSet<I> = ids.into_iter().collect();
    for id in &set {
        validate_id(field, raw(*id))?;
    }
    Ok(set)
}

/// Fetches the product row for `id` or fails with NotFound.
pub(crate) async fn require_product(
    conn: &mut SqliteConnection,
    id: ProductId,
) -> DbResult<Product> {
    let row = sqlx::query(sql::PRODUCT_BY_ID)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))?;
    product_from_row(&row)
}

/// Fetches the order row for `id` or fails with NotFound.
pub(crate) async fn require_order(conn: &mut SqliteConnection, id: OrderId) -> DbResult<Order> {
    let row = sqlx::query(sql::ORDER_BY_ID)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Order", id))?;
    order_from_row(&row)
}

/// Fetches every requested order, failing with NotFound on the smallest
/// id that doesn't exist. Result is in id order.
async fn require_orders(
    conn: &mut SqliteConnection,
    ids: &BTreeSet<OrderId>,
) -> DbResult<Vec<Order>> {
    let wanted: Vec<OrderId> = ids.iter().copied().collect();
    let mut found = BTreeMap::new();

    for chunk in wanted.chunks(BIND_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new(sql::ORDERS_BY_IDS_PREFIX);
        let mut sep = qb.separated(", ");
        for id in chunk {
            sep.push_bind(*id);
        }
        sep.push_unseparated(")");

        for row in qb.build().fetch_all(&mut *conn).await? {
            let order = order_from_row(&row)?;
            found.insert(order.id, order);
        }
    }

    if let Some(missing) = wanted.iter().find(|id| !found.contains_key(id)) {
        warn!(order_id = %missing, "Rejecting link to unknown order");
        return Err(DbError::not_found("Order", missing));
    }

    Ok(found.into_values().collect())
}

/// Fetches every requested product, failing with NotFound on the smallest
/// id that doesn't exist. Result is in id order.
async fn require_products(
    conn: &mut SqliteConnection,
    ids: &BTreeSet<ProductId>,
) -> DbResult<Vec<Product>> {
    let wanted: Vec<ProductId> = ids.iter().copied().collect();
    let mut found = BTreeMap::new();

    for chunk in wanted.chunks(BIND_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new(sql::PRODUCTS_BY_IDS_PREFIX);
        let mut sep = qb.separated(", ");
        for id in chunk {
            sep.push_bind(*id);
        }
        sep.push_unseparated(")");

        for row in qb.build().fetch_all(&mut *conn).await? {
            let product = product_from_row(&row)?;
            found.insert(product.id, product);
        }
    }

    if let Some(missing) = wanted.iter().find(|id| !found.contains_key(id)) {
        warn!(product_id = %missing, "Rejecting link to unknown product");
        return Err(DbError::not_found("Product", missing));
    }

    Ok(found.into_values().collect())
}

/// Bulk-inserts join rows, a chunk of rows per statement.
async fn insert_links(conn: &mut SqliteConnection, links: &[Link]) -> DbResult<()> {
    for chunk in links.chunks(BIND_CHUNK / 2) {
        let mut qb = QueryBuilder::<Sqlite>::new(sql::INSERT_LINKS_PREFIX);
        qb.push_values(chunk, |mut row, link| {
            row.push_bind(link.order_id).push_bind(link.product_id);
        });
        qb.build().execute(&mut *conn).await?;
    }
    Ok(())
}

/// Replaces the join rows of one product inside the caller's transaction.
///
/// Every related id is checked before the delete runs. Returns the related
/// orders (id order) so the caller can rewire its graph.
pub(crate) async fn replace_orders_of_product(
    conn: &mut SqliteConnection,
    owner: ProductId,
    related: &BTreeSet<OrderId>,
) -> DbResult<Vec<Order>> {
    let orders = require_orders(conn, related).await?;

    let deleted = sqlx::query(sql::DELETE_LINKS_OF_PRODUCT)
        .bind(owner)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let links: Vec<Link> = related.iter().map(|o| Link::new(*o, owner)).collect();
    insert_links(conn, &links).await?;

    debug!(
        product_id = %owner,
        deleted,
        inserted = links.len(),
        "Replaced product links"
    );
    Ok(orders)
}

/// Replaces the join rows of one order inside the caller's transaction.
pub(crate) async fn replace_products_of_order(
    conn: &mut SqliteConnection,
    owner: OrderId,
    related: &BTreeSet<ProductId>,
) -> DbResult<Vec<Product>> {
    let products = require_products(conn, related).await?;

    let deleted = sqlx::query(sql::DELETE_LINKS_OF_ORDER)
        .bind(owner)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let links: Vec<Link> = related.iter().map(|p| Link::new(owner, *p)).collect();
    insert_links(conn, &links).await?;

    debug!(
        order_id = %owner,
        deleted,
        inserted = links.len(),
        "Replaced order links"
    );
    Ok(products)
}

/// Opens a write transaction holding the database write lock.
pub(crate) async fn begin(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))
}

/// Commits a transaction opened with [`begin`].
pub(crate) async fn commit(tx: Transaction<'static, Sqlite>) -> DbResult<()> {
    tx.commit()
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the Product ↔ Order join table.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.associations();
///
/// // Related entities of one owner (bare, not recursed)
/// let orders = repo.orders_for_product(product_id).await?;
///
/// // Full replace, then the graph reflects the new set on both sides
/// repo.synchronize_product(&mut graph, product_id, [order_a, order_b]).await?;
/// ```
#[derive(Debug, Clone)]
pub struct AssociationRepository {
    pool: SqlitePool,
}

impl AssociationRepository {
    /// Creates a new AssociationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AssociationRepository { pool }
    }

    /// Orders linked to a product, each with empty `products`.
    ///
    /// ## Returns
    /// * `Ok(vec![])` - Product exists but has no orders
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn orders_for_product(&self, product_id: ProductId) -> DbResult<Vec<Order>> {
        debug!(product_id = %product_id, "Loading orders for product");

        let mut conn = self.pool.acquire().await?;
        require_product(&mut conn, product_id).await?;
        load_orders_for_product(&mut conn, product_id).await
    }

    /// Products linked to an order, each with empty `orders`.
    ///
    /// ## Returns
    /// * `Ok(vec![])` - Order exists but has no products
    /// * `Err(DbError::NotFound)` - Order doesn't exist
    pub async fn products_for_order(&self, order_id: OrderId) -> DbResult<Vec<Product>> {
        debug!(order_id = %order_id, "Loading products for order");

        let mut conn = self.pool.acquire().await?;
        require_order(&mut conn, order_id).await?;
        load_products_for_order(&mut conn, order_id).await
    }

    /// Replaces a product's whole order set.
    ///
    /// ## What This Does
    /// 1. Collapses duplicate ids
    /// 2. In one transaction: checks the product and every order exist,
    ///    deletes the product's join rows, inserts one row per order
    /// 3. Rewires `graph`: the product (entered if absent) now links to
    ///    exactly these orders, and orders it left no longer point back
    ///
    /// ## Returns
    /// The applied order set.
    ///
    /// ## Errors
    /// * `DbError::Validation` - An id is zero or negative
    /// * `DbError::NotFound` - Product or an order doesn't exist (nothing written)
    /// * `DbError::TransactionFailed` / `QueryFailed` - Storage failure (rolled back)
    pub async fn synchronize_product(
        &self,
        graph: &mut EntityGraph,
        owner: ProductId,
        related: impl IntoIterator<Item = OrderId>,
    ) -> DbResult<BTreeSet<OrderId>> {
        validate_id("product_id", owner.get())?;
        let related = requested_set("order_id", related, |id: OrderId| id.get())?;

        debug!(product_id = %owner, count = related.len(), "Synchronizing product orders");

        let mut tx = begin(&self.pool).await?;
        let product = require_product(&mut tx, owner).await?;
        let orders = replace_orders_of_product(&mut tx, owner, &related).await?;
        commit(tx).await?;

        graph.insert_product(product);
        graph.replace_orders_of(owner, orders)?;

        Ok(related)
    }

    /// Replaces an order's whole product set.
    ///
    /// Mirror image of [`AssociationRepository::synchronize_product`].
    pub async fn synchronize_order(
        &self,
        graph: &mut EntityGraph,
        owner: OrderId,
        related: impl IntoIterator<Item = ProductId>,
    ) -> DbResult<BTreeSet<ProductId>> {
        validate_id("order_id", owner.get())?;
        let related = requested_set("product_id", related, |id: ProductId| id.get())?;

        debug!(order_id = %owner, count = related.len(), "Synchronizing order products");

        let mut tx = begin(&self.pool).await?;
        let order = require_order(&mut tx, owner).await?;
        let products = replace_products_of_order(&mut tx, owner, &related).await?;
        commit(tx).await?;

        graph.insert_order(order);
        graph.replace_products_of(owner, products)?;

        Ok(related)
    }

    /// Every join row, ordered by (order_id, product_id).
    pub async fn links(&self) -> DbResult<Vec<Link>> {
        let rows: Vec<(OrderId, ProductId)> = sqlx::query_as(sql::ALL_LINKS)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(o, p)| Link::new(o, p)).collect())
    }

    /// Join rows of one product, ordered by order id.
    pub async fn links_for_product(&self, product_id: ProductId) -> DbResult<Vec<Link>> {
        let rows: Vec<(OrderId, ProductId)> = sqlx::query_as(sql::LINKS_OF_PRODUCT)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(o, p)| Link::new(o, p)).collect())
    }

    /// Join rows of one order, ordered by product id.
    pub async fn links_for_order(&self, order_id: OrderId) -> DbResult<Vec<Link>> {
        let rows: Vec<(OrderId, ProductId)> = sqlx::query_as(sql::LINKS_OF_ORDER)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(o, p)| Link::new(o, p)).collect())
    }

    /// Counts join rows (for diagnostics).
    pub async fn count_links(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(sql::COUNT_LINKS)
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
    use crate::pool::{Database, DbConfig};
    use productstore_core::{Money, NewOrder, NewProduct};

    async fn setup() -> (Database, Vec<ProductId>, Vec<OrderId>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut products = Vec::new();
        for name in ["A", "B", "C"] {
            let new = NewProduct::new(name, Money::from_cents(250));
            products.push(db.products().create(&new).await.unwrap().id);
        }

        let mut orders = Vec::new();
        for _ in 0..3 {
            orders.push(db.orders().create(&NewOrder::default()).await.unwrap().id);
        }

        (db, products, orders)
    }

    #[tokio::test]
    async fn test_batched_pairs_follow_per_entity_order() {
        let (db, products, orders) = setup().await;
        let mut graph = EntityGraph::new();
        let repo = db.associations();
        repo.synchronize_product(&mut graph, products[0], [orders[2], orders[0]])
            .await
            .unwrap();
        repo.synchronize_product(&mut graph, products[2], [orders[1]])
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let batched = load_orders_for_products(&mut conn, &products).await.unwrap();

        let mut per_entity = Vec::new();
        for owner in &products {
            for order in load_orders_for_product(&mut conn, *owner).await.unwrap() {
                per_entity.push((*owner, order));
            }
        }

        assert_eq!(batched, per_entity);
        assert_eq!(
            batched.iter().map(|(p, o)| (*p, o.id)).collect::<Vec<_>>(),
            vec![
                (products[0], orders[0]),
                (products[0], orders[2]),
                (products[2], orders[1]),
            ]
        );
    }

    #[tokio::test]
    async fn test_loaded_entities_have_empty_back_references() {
        let (db, products, orders) = setup().await;
        let mut graph = EntityGraph::new();
        db.associations()
            .synchronize_order(&mut graph, orders[0], [products[1]])
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let loaded = load_products_for_order(&mut conn, orders[0]).await.unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "B");
        assert!(loaded[0].orders.is_empty());
    }

    #[tokio::test]
    async fn test_owner_without_links_loads_nothing() {
        let (db, products, _) = setup().await;

        let orders = db.associations().orders_for_product(products[1]).await.unwrap();

        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_related_lookup_of_missing_owner() {
        let (db, _, _) = setup().await;

        let err = db
            .associations()
            .products_for_order(OrderId::new(50))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_hydrate_empty_input() {
        let (db, _, _) = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();

        for strategy in [LoadStrategy::Batched, LoadStrategy::PerEntity] {
            let hydrated = hydrate_orders(&mut conn, Vec::new(), strategy).await.unwrap();
            assert!(hydrated.is_empty());
            assert!(hydrated.graph().is_empty());
        }
    }

    #[tokio::test]
    async fn test_large_link_set_spans_insert_chunks() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .create(&NewProduct::new("Bulk", Money::from_cents(1)))
            .await
            .unwrap();

        let mut orders = Vec::new();
        for _ in 0..(BIND_CHUNK + 25) {
            orders.push(db.orders().create(&NewOrder::default()).await.unwrap().id);
        }

        let mut graph = EntityGraph::new();
        db.associations()
            .synchronize_product(&mut graph, product.id, orders.clone())
            .await
            .unwrap();

        assert_eq!(
            db.associations().count_links().await.unwrap(),
            orders.len() as i64
        );
        assert_eq!(graph.product(product.id).unwrap().orders, orders);
    }
}
