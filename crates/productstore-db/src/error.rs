//! Storage errors.
//!
//! Every repository call returns [`DbResult`]. Failures from sqlx, from the
//! core validators and from the migrator all land in [`DbError`], and
//! [`DbError::kind`] sorts them into four buckets a serving layer can map
//! without knowing the variants:
//!
//! ```text
//!   ValidationError ─────────────► Validation
//!   missing entity id ───────────► NotFound
//!   bad column, undecodable ─────► Mapping
//!   everything sqlx/SQLite else ─► Persistence
//! ```
//!
//! Nothing here retries.

use productstore_core::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row with this id. Raised on reads, updates, deletes, and when a
    /// synchronize names an owner or related entity that doesn't exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A row came back without a column the mapper needs, or with a value
    /// it can't decode (text in `price_cents`, a negative price).
    #[error("Cannot map column {column}: {reason}")]
    Mapping { column: String, reason: String },

    /// `columns` is the list SQLite reports, e.g.
    /// `orders_products.order_id, orders_products.product_id`.
    #[error("Unique constraint violated on {columns}")]
    UniqueViolation { columns: String },

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Cannot connect to the store: {0}")]
    ConnectionFailed(String),

    #[error("Schema migration failed: {0}")]
    MigrationFailed(String),

    #[error("Statement failed: {0}")]
    QueryFailed(String),

    /// Begin or commit failed. The transaction's writes are discarded.
    #[error("Transaction aborted: {0}")]
    TransactionFailed(String),

    #[error("Timed out waiting for a pooled connection")]
    PoolExhausted,

    #[error("Unexpected storage error: {0}")]
    Internal(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Coarse class of a [`DbError`]. `NotFound` is never folded into
/// `Persistence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Persistence,
    Mapping,
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn mapping(column: impl Into<String>, reason: impl Into<String>) -> Self {
        DbError::Mapping {
            column: column.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Validation(_) => ErrorKind::Validation,
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::Mapping { .. } => ErrorKind::Mapping,
            _ => ErrorKind::Persistence,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }

    /// Sorts a SQLite error message by the constraint it names.
    fn from_sqlite_message(message: &str) -> Self {
        const UNIQUE: &str = "UNIQUE constraint failed: ";

        if let Some(columns) = message.strip_prefix(UNIQUE) {
            DbError::UniqueViolation {
                columns: columns.to_string(),
            }
        } else if message.starts_with("FOREIGN KEY constraint failed") {
            DbError::ForeignKeyViolation(message.to_string())
        } else {
            DbError::QueryFailed(message.to_string())
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            // lookups raise NotFound with entity and id themselves
            sqlx::Error::RowNotFound => {
                DbError::Internal("statement returned no rows".to_string())
            }
            sqlx::Error::ColumnNotFound(column) => {
                DbError::mapping(column, "not present in the result set")
            }
            // the index arrives Debug-formatted, quotes included
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::mapping(index.trim_matches('"'), source.to_string())
            }
            sqlx::Error::Database(db_err) => DbError::from_sqlite_message(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => DbError::not_found("Product", id),
            CoreError::OrderNotFound(id) => DbError::not_found("Order", id),
            CoreError::Validation(e) => DbError::Validation(e),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use productstore_core::ProductId;

    #[test]
    fn test_kinds_cover_the_four_buckets() {
        let validation: DbError = ValidationError::Required { field: "name".into() }.into();

        assert_eq!(validation.kind(), ErrorKind::Validation);
        assert_eq!(DbError::not_found("Product", 3).kind(), ErrorKind::NotFound);
        assert_eq!(DbError::mapping("price_cents", "negative").kind(), ErrorKind::Mapping);
        assert_eq!(DbError::PoolExhausted.kind(), ErrorKind::Persistence);
        assert_eq!(
            DbError::TransactionFailed("disk I/O error".into()).kind(),
            ErrorKind::Persistence
        );
    }

    #[test]
    fn test_not_found_names_entity_and_id() {
        let err = DbError::not_found("Order", 12);

        assert_eq!(err.to_string(), "Order not found: 12");
        assert!(err.is_not_found());
        assert!(!DbError::QueryFailed("x".into()).is_not_found());
    }

    #[test]
    fn test_sqlite_messages_are_classified() {
        let err = DbError::from_sqlite_message(
            "UNIQUE constraint failed: orders_products.order_id, orders_products.product_id",
        );
        assert!(matches!(
            err,
            DbError::UniqueViolation { ref columns }
                if columns == "orders_products.order_id, orders_products.product_id"
        ));

        let err = DbError::from_sqlite_message("FOREIGN KEY constraint failed");
        assert!(matches!(err, DbError::ForeignKeyViolation(_)));

        let err = DbError::from_sqlite_message("no such table: widgets");
        assert!(matches!(err, DbError::QueryFailed(ref m) if m == "no such table: widgets"));
    }

    #[test]
    fn test_sqlx_errors_are_classified() {
        let err: DbError = sqlx::Error::ColumnNotFound("price_cents".to_string()).into();
        assert!(matches!(err, DbError::Mapping { ref column, .. } if column == "price_cents"));

        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::PoolExhausted));

        let err: DbError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, DbError::ConnectionFailed(_)));

        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::Internal(_)));
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }

    #[test]
    fn test_graph_misses_become_not_found() {
        let err: DbError = CoreError::ProductNotFound(ProductId::new(9)).into();
        assert_eq!(err.to_string(), "Product not found: 9");
    }
}
