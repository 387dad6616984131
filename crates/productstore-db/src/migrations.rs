//! Schema setup.
//!
//! The SQL under `migrations/sqlite/` is compiled into the binary. Applied
//! versions are tracked in `_sqlx_migrations`, so opening an existing store
//! only runs what it hasn't seen. Files are applied in name order and are
//! never edited once released; schema changes go in a new numbered file.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Brings the schema up to date. A store that is already current is left
/// untouched.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema is current");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn applied(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_rerun_is_a_no_op() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let before = applied(db.pool()).await;

        run_migrations(db.pool()).await.unwrap();

        assert_eq!(before, MIGRATOR.migrations.len() as i64);
        assert_eq!(applied(db.pool()).await, before);
    }

    #[tokio::test]
    async fn test_schema_has_join_table() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name IN ('products', 'orders', 'orders_products') \
             ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        assert_eq!(tables, ["orders", "orders_products", "products"]);
    }
}
