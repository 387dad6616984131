//! # Database Handle and Settings
//!
//! [`DbConfig`] describes where the store lives and how the pool behaves;
//! [`Database`] owns the pool and hands out repositories.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::from_env()?          PRODUCTSTORE_DB_* variables             │
//! │  DbConfig::in_memory()          tests: private database per call        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Database::new(config)                                                  │
//! │        ├── connect options: WAL, synchronous=NORMAL, foreign_keys=ON    │
//! │        ├── SqlitePool (1..=max_connections)                             │
//! │        └── embedded migrations (unless disabled)                        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  db.products() / db.orders() / db.associations()                        │
//! │        each call borrows a pooled connection or opens a transaction,    │
//! │        and gives it back on return, error paths included                │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  db.close()                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Foreign keys are off by default in SQLite. The join table relies on them
//! for cascading deletes, so every connection turns them on.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::association::AssociationRepository;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;

// =============================================================================
// Association Load Strategy
// =============================================================================

/// How associations are fetched when a read returns many entities.
///
/// ```text
/// PerEntity:  SELECT page ─► SELECT links WHERE owner = 1
///                         ─► SELECT links WHERE owner = 2      (1 + N queries)
///                         ─► ...
///
/// Batched:    SELECT page ─► SELECT links WHERE owner IN (1, 2, ...)  (2 queries)
/// ```
///
/// Both produce the same graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStrategy {
    /// One association lookup per entity.
    PerEntity,
    /// One association lookup for the whole result set.
    #[default]
    Batched,
}

impl FromStr for LoadStrategy {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "batched" => Ok(LoadStrategy::Batched),
            "per_entity" | "per-entity" => Ok(LoadStrategy::PerEntity),
            _ => Err(ConfigError::InvalidValue(ENV_LOAD_STRATEGY.to_string())),
        }
    }
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadStrategy::PerEntity => "per_entity",
            LoadStrategy::Batched => "batched",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Settings
// =============================================================================

const ENV_DB_PATH: &str = "PRODUCTSTORE_DB_PATH";
const ENV_MAX_CONNECTIONS: &str = "PRODUCTSTORE_DB_MAX_CONNECTIONS";
const ENV_LOAD_STRATEGY: &str = "PRODUCTSTORE_DB_LOAD_STRATEGY";

/// Default database file when nothing is configured.
pub const DEFAULT_DB_PATH: &str = "productstore.db";

/// Path value that selects a private in-memory database.
const MEMORY_PATH: &str = ":memory:";

/// A setting that could not be read.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The named variable holds a value that doesn't parse or is out of range.
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

/// Where the store lives and how its pool behaves.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/productstore/store.db")
///     .max_connections(8)
///     .load_strategy(LoadStrategy::PerEntity);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first connect. `:memory:` for a throwaway store.
    pub database_path: PathBuf,

    /// Upper bound on pooled connections (default 5).
    pub max_connections: u32,

    /// Connections kept open while idle (default 1).
    pub min_connections: u32,

    /// How long a caller waits for a free connection (default 30s).
    pub connect_timeout: Duration,

    /// Idle connections above the minimum are closed after this long.
    /// `None` keeps them open.
    pub idle_timeout: Option<Duration>,

    /// Apply pending migrations inside [`Database::new`] (default on).
    pub run_migrations: bool,

    /// Association loading for multi-entity reads (default batched).
    pub load_strategy: LoadStrategy,
}

impl DbConfig {
    /// Settings for a database file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            run_migrations: true,
            load_strategy: LoadStrategy::default(),
        }
    }

    /// Settings for a private in-memory store.
    ///
    /// Every call yields a separate, empty database. It lives exactly as long
    /// as its single connection, so that connection is never recycled.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            ..DbConfig::new(MEMORY_PATH)
        }
    }

    /// Reads settings from the process environment.
    ///
    /// | Variable                           | Default            |
    /// |------------------------------------|--------------------|
    /// | `PRODUCTSTORE_DB_PATH`             | `productstore.db`  |
    /// | `PRODUCTSTORE_DB_MAX_CONNECTIONS`  | `5`                |
    /// | `PRODUCTSTORE_DB_LOAD_STRATEGY`    | `batched`          |
    pub fn from_env() -> Result<Self, ConfigError> {
        DbConfig::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through any key lookup (environment, file, test map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config =
            DbConfig::new(lookup(ENV_DB_PATH).unwrap_or_else(|| DEFAULT_DB_PATH.to_string()));

        if let Some(raw) = lookup(ENV_MAX_CONNECTIONS) {
            let max = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()))?;
            config = config.max_connections(max);
        }

        if let Some(raw) = lookup(ENV_LOAD_STRATEGY) {
            config.load_strategy = raw.parse()?;
        }

        Ok(config)
    }

    /// Caps the pool. The minimum follows it down if needed.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self.min_connections = self.min_connections.min(max);
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Ignored for in-memory stores, whose one connection must stay open.
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn load_strategy(mut self, strategy: LoadStrategy) -> Self {
        self.load_strategy = strategy;
        self
    }

    /// Whether this points at a throwaway in-memory store.
    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
        };

        Ok(options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.connect_timeout)
            .foreign_keys(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to an open store.
///
/// Cloning is cheap: clones share the same pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::from_env()?).await?;
///
/// let widget = db.products().create(&NewProduct::new("Widget", price)).await?;
/// let order = db.orders().create(&NewOrder::default()).await?;
///
/// let mut loaded = db.products().get_by_id(widget.id).await?;
/// db.associations()
///     .synchronize_product(loaded.graph_mut(), widget.id, [order.id])
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    load_strategy: LoadStrategy,
}

impl Database {
    /// Opens the pool described by `config`, then migrates if asked to.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            load_strategy = %config.load_strategy,
            "Opening product store"
        );

        let options = config.connect_options()?;

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout);
        if config.is_in_memory() {
            pool_options = pool_options
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        } else {
            pool_options = pool_options.idle_timeout(config.idle_timeout);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!("Pool connected");

        let db = Database {
            pool,
            load_strategy: config.load_strategy,
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. [`Database::new`] does this unless
    /// `run_migrations` is off.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn load_strategy(&self) -> LoadStrategy {
        self.load_strategy
    }

    /// Product operations, using this handle's load strategy.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone()).with_load_strategy(self.load_strategy)
    }

    /// Order operations, using this handle's load strategy.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone()).with_load_strategy(self.load_strategy)
    }

    /// Join-table reads and full-replace writes.
    pub fn associations(&self) -> AssociationRepository {
        AssociationRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections to return, then closes the pool.
    /// Every later operation fails with `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing product store");
        self.pool.close().await;
    }

    /// True if a trivial query round-trips.
    pub async fn health_check(&self) -> bool {
        let probe: Result<i64, _> = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await;
        probe.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |key: &str| vars.get(key).map(|v| v.to_string())
    }

    #[tokio::test]
    async fn test_in_memory_store_is_healthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        assert_eq!(db.load_strategy(), LoadStrategy::Batched);
    }

    #[tokio::test]
    async fn test_in_memory_stores_are_separate() {
        let first = Database::new(DbConfig::in_memory()).await.unwrap();
        let second = Database::new(DbConfig::in_memory()).await.unwrap();

        sqlx::query("INSERT INTO orders (created_at, updated_at) VALUES ('x', 'x')")
            .execute(first.pool())
            .await
            .unwrap();

        assert_eq!(first.orders().count().await.unwrap(), 1);
        assert_eq!(second.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_closed_pool_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        assert!(!db.health_check().await);
        let err = db.products().count().await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
    }

    #[test]
    fn test_builder_keeps_min_within_max() {
        let config = DbConfig::new("store.db")
            .min_connections(4)
            .max_connections(2)
            .idle_timeout(None)
            .load_strategy(LoadStrategy::PerEntity);

        assert_eq!(config.max_connections, 2);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.idle_timeout, None);
        assert_eq!(config.load_strategy, LoadStrategy::PerEntity);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }

    #[test]
    fn test_lookup_defaults() {
        let config = DbConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.load_strategy, LoadStrategy::Batched);
    }

    #[test]
    fn test_lookup_overrides() {
        let config = DbConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, "/var/lib/store.db"),
            (ENV_MAX_CONNECTIONS, "8"),
            (ENV_LOAD_STRATEGY, "Per-Entity"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/store.db"));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.load_strategy, LoadStrategy::PerEntity);
    }

    #[test]
    fn test_lookup_rejects_malformed_values() {
        for pairs in [
            [(ENV_MAX_CONNECTIONS, "many")],
            [(ENV_MAX_CONNECTIONS, "0")],
            [(ENV_LOAD_STRATEGY, "eager")],
        ] {
            let err = DbConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(err.to_string().starts_with("Invalid value for PRODUCTSTORE_DB_"));
        }
    }

    #[test]
    fn test_load_strategy_display_parses_back() {
        for strategy in [LoadStrategy::Batched, LoadStrategy::PerEntity] {
            assert_eq!(strategy.to_string().parse::<LoadStrategy>().unwrap(), strategy);
        }
    }
}
