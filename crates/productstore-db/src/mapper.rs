//! # Row Mapper
//!
//! Turns one SQLite result row into one entity value.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ row: id=1 │ name='Widget' │ price_cents=999 │ created_at=... │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                ▼
//!        Product { id: 1, name: "Widget", price_cents: 999,
//!                  orders: [] }        ← never left unset
//! ```
//!
//! A mapper reads only the row it is given and only scalar columns;
//! association sequences always start out empty. Joined queries alias the
//! related side's columns, so every mapper takes a column set naming where
//! to look.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::{DbError, DbResult};
use productstore_core::{Order, OrderId, Product, ProductId, UserId};

// =============================================================================
// Column Sets
// =============================================================================

/// Column names a product is read from.
#[derive(Debug, Clone, Copy)]
pub struct ProductColumns {
    pub id: &'static str,
    pub name: &'static str,
    pub price_cents: &'static str,
    pub created_at: &'static str,
    pub updated_at: &'static str,
}

/// Column names an order is read from.
#[derive(Debug, Clone, Copy)]
pub struct OrderColumns {
    pub id: &'static str,
    pub user_id: &'static str,
    pub created_at: &'static str,
    pub updated_at: &'static str,
}

/// `SELECT * FROM products`
pub const PRODUCT_COLUMNS: ProductColumns = ProductColumns {
    id: "id",
    name: "name",
    price_cents: "price_cents",
    created_at: "created_at",
    updated_at: "updated_at",
};

/// Product columns aliased on the related side of a join.
pub const RELATED_PRODUCT_COLUMNS: ProductColumns = ProductColumns {
    id: "product_id",
    name: "product_name",
    price_cents: "product_price_cents",
    created_at: "product_created_at",
    updated_at: "product_updated_at",
};

/// `SELECT * FROM orders`
pub const ORDER_COLUMNS: OrderColumns = OrderColumns {
    id: "id",
    user_id: "user_id",
    created_at: "created_at",
    updated_at: "updated_at",
};

/// Order columns aliased on the related side of a join.
pub const RELATED_ORDER_COLUMNS: OrderColumns = OrderColumns {
    id: "order_id",
    user_id: "order_user_id",
    created_at: "order_created_at",
    updated_at: "order_updated_at",
};

// =============================================================================
// Mappers
// =============================================================================

/// Maps a `products` row.
pub fn product_from_row(row: &SqliteRow) -> DbResult<Product> {
    product_from_columns(row, &PRODUCT_COLUMNS)
}

/// Maps an `orders` row.
pub fn order_from_row(row: &SqliteRow) -> DbResult<Order> {
    order_from_columns(row, &ORDER_COLUMNS)
}

/// Maps a product from an arbitrary column set.
///
/// ## Errors
/// `DbError::Mapping` when a column is missing, has the wrong type, or
/// holds a value no product may have (empty name, negative price).
pub fn product_from_columns(row: &SqliteRow, cols: &ProductColumns) -> DbResult<Product> {
    let id: i64 = row.try_get(cols.id)?;
    let name: String = row.try_get(cols.name)?;
    let price_cents: i64 = row.try_get(cols.price_cents)?;
    let created_at: DateTime<Utc> = row.try_get(cols.created_at)?;
    let updated_at: DateTime<Utc> = row.try_get(cols.updated_at)?;

    if name.trim().is_empty() {
        return Err(DbError::mapping(cols.name, "empty product name"));
    }
    if price_cents < 0 {
        return Err(DbError::mapping(
            cols.price_cents,
            format!("negative price {price_cents}"),
        ));
    }

    Ok(Product {
        id: ProductId::new(id),
        name,
        price_cents,
        created_at,
        updated_at,
        orders: Vec::new(),
    })
}

/// Maps an order from an arbitrary column set.
pub fn order_from_columns(row: &SqliteRow, cols: &OrderColumns) -> DbResult<Order> {
    let id: i64 = row.try_get(cols.id)?;
    let user_id: Option<i64> = row.try_get(cols.user_id)?;
    let created_at: DateTime<Utc> = row.try_get(cols.created_at)?;
    let updated_at: DateTime<Utc> = row.try_get(cols.updated_at)?;

    Ok(Order {
        id: OrderId::new(id),
        user_id: user_id.map(UserId::new),
        created_at,
        updated_at,
        products: Vec::new(),
    })
}

/// Maps the related product of a LEFT JOIN row.
///
/// `Ok(None)` when the related side is all nulls (owner without links).
pub fn related_product_from_row(row: &SqliteRow) -> DbResult<Option<Product>> {
    let id: Option<i64> = row.try_get(RELATED_PRODUCT_COLUMNS.id)?;
    match id {
        Some(_) => product_from_columns(row, &RELATED_PRODUCT_COLUMNS).map(Some),
        None => Ok(None),
    }
}

/// Maps the related order of a LEFT JOIN row.
///
/// `Ok(None)` when the related side is all nulls (owner without links).
pub fn related_order_from_row(row: &SqliteRow) -> DbResult<Option<Order>> {
    let id: Option<i64> = row.try_get(RELATED_ORDER_COLUMNS.id)?;
    match id {
        Some(_) => order_from_columns(row, &RELATED_ORDER_COLUMNS).map(Some),
        None => Ok(None),
    }
}

/// Reads the owning product id carried by a batched association row.
pub(crate) fn owner_product_id(row: &SqliteRow) -> DbResult<ProductId> {
    let id: i64 = row.try_get("owner_id")?;
    Ok(ProductId::new(id))
}

/// Reads the owning order id carried by a batched association row.
pub(crate) fn owner_order_id(row: &SqliteRow) -> DbResult<OrderId> {
    let id: i64 = row.try_get("owner_id")?;
    Ok(OrderId::new(id))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pool::{Database, DbConfig};

    async fn fetch_row(db: &Database, sql: &str) -> SqliteRow {
        sqlx::query(sql).fetch_one(db.pool()).await.unwrap()
    }

    #[tokio::test]
    async fn test_maps_product_row_with_empty_orders() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let row = fetch_row(
            &db,
            "SELECT 3 AS id, 'Widget' AS name, 999 AS price_cents, \
             '2024-01-01T00:00:00Z' AS created_at, '2024-01-02T00:00:00Z' AS updated_at",
        )
        .await;

        let product = product_from_row(&row).unwrap();

        assert_eq!(product.id, ProductId::new(3));
        assert_eq!(product.name, "Widget");
        assert_eq!(product.price_cents, 999);
        assert!(product.orders.is_empty());
    }

    #[tokio::test]
    async fn test_missing_column_is_mapping_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let row = fetch_row(&db, "SELECT 1 AS id, 'Widget' AS name").await;

        let err = product_from_row(&row).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Mapping);
    }

    #[tokio::test]
    async fn test_malformed_price_is_mapping_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let row = fetch_row(
            &db,
            "SELECT 1 AS id, 'Widget' AS name, 'nine ninety-nine' AS price_cents, \
             '2024-01-01T00:00:00Z' AS created_at, '2024-01-01T00:00:00Z' AS updated_at",
        )
        .await;

        let err = product_from_row(&row).unwrap_err();

        assert!(matches!(err, DbError::Mapping { ref column, .. } if column == "price_cents"));
    }

    #[tokio::test]
    async fn test_negative_price_is_mapping_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let row = fetch_row(
            &db,
            "SELECT 1 AS id, 'Widget' AS name, -5 AS price_cents, \
             '2024-01-01T00:00:00Z' AS created_at, '2024-01-01T00:00:00Z' AS updated_at",
        )
        .await;

        assert_eq!(product_from_row(&row).unwrap_err().kind(), ErrorKind::Mapping);
    }

    #[tokio::test]
    async fn test_maps_order_row_with_null_user() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let row = fetch_row(
            &db,
            "SELECT 8 AS id, NULL AS user_id, \
             '2024-01-01T00:00:00Z' AS created_at, '2024-01-01T00:00:00Z' AS updated_at",
        )
        .await;

        let order = order_from_row(&row).unwrap();

        assert_eq!(order.id, OrderId::new(8));
        assert_eq!(order.user_id, None);
        assert!(order.products.is_empty());
    }

    #[tokio::test]
    async fn test_null_related_side_maps_to_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let row = fetch_row(
            &db,
            "SELECT NULL AS order_id, NULL AS order_user_id, \
             NULL AS order_created_at, NULL AS order_updated_at",
        )
        .await;

        assert!(related_order_from_row(&row).unwrap().is_none());
    }
}
