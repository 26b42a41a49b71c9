//! Storage layer - SQLite
//!
//! Provides database management and migrations for the graph store.
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//!
//! # Usage
//!
//! ```ignore
//! use ontograph_core::storage::Database;
//!
//! // Create an in-memory database for testing
//! let db = Database::in_memory().await?;
//!
//! // Or open the store on disk
//! let db = Database::open("graph.db").await?;
//! ```

pub mod database;
pub mod migrations;

// Re-export commonly used types
pub use database::{DEFAULT_MAX_CONNECTIONS, Database, DatabaseConfig, default_database_path};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
