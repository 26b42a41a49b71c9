//! SQLite database operations
//!
//! Opens the graph store's connection pool and brings its schema up to date.

use crate::storage::migrations;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Default maximum connections in the pool
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const MEMORY_PATH: &str = ":memory:";

/// Where and how the graph store is opened
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Store file, or `:memory:`
    pub path: PathBuf,
    pub max_connections: u32,
    /// Bring the schema to [`migrations::CURRENT_VERSION`] on open
    pub auto_migrate: bool,
    /// WAL keeps readers off uncommitted imports
    pub journal_mode: SqliteJournalMode,
    pub synchronous: SqliteSynchronous,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::with_path(default_database_path())
    }
}

impl DatabaseConfig {
    /// Store backed by the file at `path`
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auto_migrate: true,
            journal_mode: SqliteJournalMode::Wal,
            synchronous: SqliteSynchronous::Normal,
        }
    }

    /// Private in-memory store, gone when the pool closes
    ///
    /// Every connection would see its own empty database, so the pool is
    /// pinned to one.
    pub fn in_memory() -> Self {
        Self {
            max_connections: 1,
            ..Self::with_path(MEMORY_PATH)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn no_migrate(mut self) -> Self {
        self.auto_migrate = false;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }

    /// Connection options for this store
    ///
    /// File paths are handed to SQLite as-is, never through a connection URL,
    /// so `%` and `?` in a file name stay literal.
    fn connect_options(&self) -> Result<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.path)
                .create_if_missing(true)
        };

        Ok(options
            .journal_mode(self.journal_mode)
            .synchronous(self.synchronous)
            .foreign_keys(true))
    }
}

/// Get the default graph store path
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("ontograph"))
        .unwrap_or_default()
        .join("graph.db")
}

/// Connection pool over a migrated graph store
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    config: DatabaseConfig,
}

impl Database {
    /// Open the store described by `config`, creating the file and its
    /// directory when missing
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        if !config.is_in_memory() {
            if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options()?)
            .await
            .with_context(|| format!("Failed to connect to database: {}", config.path.display()))?;
        debug!(path = %config.path.display(), "Graph store pool opened");

        let db = Self { pool, config };
        if db.config.auto_migrate {
            db.migrate().await?;
        }
        Ok(db)
    }

    /// Open the graph store at `path`
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(DatabaseConfig::with_path(path)).await
    }

    /// Fresh in-memory store, used by tests
    pub async fn in_memory() -> Result<Self> {
        Self::new(DatabaseConfig::in_memory()).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub async fn migrate(&self) -> Result<()> {
        migrations::run_migrations(&self.pool)
            .await
            .context("Failed to run database migrations")
    }

    pub async fn migration_status(&self) -> Result<migrations::MigrationStatus> {
        migrations::migration_status(&self.pool)
            .await
            .context("Failed to check migration status")
    }

    /// Round-trip a trivial query through the pool
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }

    /// Flush and close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// The store file as configured
    pub fn path(&self) -> &Path {
        &self.config.path
    }
}
