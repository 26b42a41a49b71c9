//! Graph store schema migrations
//!
//! Versioned, applied in order when a store is opened. The applied versions
//! are recorded in `_migrations`.

use anyhow::Context;
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Schema version this build expects
pub const CURRENT_VERSION: i32 = 2;

const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: Property graph schema
const MIGRATION_V1: &str = r#"
    -- Nodes
    CREATE TABLE IF NOT EXISTS graph_nodes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    -- Node properties (string-valued)
    CREATE TABLE IF NOT EXISTS node_properties (
        node_id INTEGER NOT NULL REFERENCES graph_nodes(id) ON DELETE CASCADE,
        key TEXT NOT NULL,
        value TEXT NOT NULL,
        PRIMARY KEY (node_id, key)
    );

    CREATE INDEX IF NOT EXISTS idx_node_properties_key_value ON node_properties(key, value);

    -- Node labels
    CREATE TABLE IF NOT EXISTS node_labels (
        node_id INTEGER NOT NULL REFERENCES graph_nodes(id) ON DELETE CASCADE,
        label TEXT NOT NULL,
        PRIMARY KEY (node_id, label)
    );

    CREATE INDEX IF NOT EXISTS idx_node_labels_label ON node_labels(label);

    -- Relationships
    CREATE TABLE IF NOT EXISTS relationships (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        start_node INTEGER NOT NULL REFERENCES graph_nodes(id) ON DELETE CASCADE,
        end_node INTEGER NOT NULL REFERENCES graph_nodes(id) ON DELETE CASCADE,
        rel_type TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_relationships_start ON relationships(start_node, rel_type);
    CREATE INDEX IF NOT EXISTS idx_relationships_end ON relationships(end_node, rel_type);
"#;

/// Migration 2: Unique node index
const MIGRATION_V2: &str = r#"
    -- One entry per (index, key, value); the primary key is the uniqueness guarantee
    CREATE TABLE IF NOT EXISTS unique_node_index (
        index_name TEXT NOT NULL,
        key TEXT NOT NULL,
        value TEXT NOT NULL,
        node_id INTEGER NOT NULL REFERENCES graph_nodes(id) ON DELETE CASCADE,
        PRIMARY KEY (index_name, key, value)
    );

    CREATE INDEX IF NOT EXISTS idx_unique_node_index_node ON unique_node_index(node_id);
"#;

/// A numbered schema step
struct Migration {
    version: i32,
    name: &'static str,
    sql: &'static str,
}

/// Every schema step, in application order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "property graph schema",
        sql: MIGRATION_V1,
    },
    Migration {
        version: 2,
        name: "unique node index",
        sql: MIGRATION_V2,
    },
];

/// Highest applied version, 0 for a fresh store
async fn applied_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    let (version,): (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

/// Apply pending migrations, each in its own transaction
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let applied = applied_version(pool).await?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > applied).collect();

    if pending.is_empty() {
        debug!(version = applied, "Graph store schema is up to date");
        return Ok(());
    }

    for migration in pending {
        info!(version = migration.version, name = migration.name, "Applying migration");

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.sql)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Migration v{} failed", migration.version))?;
        sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
            .bind(migration.version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    info!(version = CURRENT_VERSION, "Graph store schema migrated");
    Ok(())
}

/// Whether the store is behind [`CURRENT_VERSION`]
pub async fn needs_migration(pool: &SqlitePool) -> anyhow::Result<bool> {
    Ok(applied_version(pool).await? < CURRENT_VERSION)
}

pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = applied_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Schema version of a store against the one this build expects
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    pub current_version: i32,
    pub target_version: i32,
    pub needs_migration: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool")
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await;

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, 0);
        assert!(status.needs_migration);

        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
        assert!(!status.needs_migration);
        assert!(!needs_migration(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let pool = create_test_pool().await;

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_tables_created() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        let tables = vec![
            "graph_nodes",
            "node_properties",
            "node_labels",
            "relationships",
            "unique_node_index",
        ];

        for table in tables {
            let result: (i32,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap_or_else(|_| panic!("Table {} should exist", table));
            assert_eq!(result.0, 0, "Table {} should be empty", table);
        }
    }

    #[test]
    fn test_migration_list_matches_current_version() {
        let versions: Vec<i32> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert_eq!(versions, (1..=CURRENT_VERSION).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicates() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        sqlx::query("INSERT INTO graph_nodes DEFAULT VALUES")
            .execute(&pool)
            .await
            .unwrap();

        let insert = "INSERT INTO unique_node_index (index_name, key, value, node_id) VALUES ('index', 'name', 'Animal', 1)";
        sqlx::query(insert).execute(&pool).await.unwrap();
        assert!(sqlx::query(insert).execute(&pool).await.is_err());
    }
}
