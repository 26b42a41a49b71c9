//! SQLite implementation of the GraphStore
//!
//! Nodes, labels, properties and relationships live in plain tables; the
//! `unique_node_index` primary key backs get-or-create.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::domain::graph::{
    GraphStore, GraphTransaction, NAME_PROPERTY, NodeId, NodeInitializer, NodeProperties,
    RelationshipId, UniqueNode,
};
use crate::error::StoreError;

/// SQLite-backed property graph store
#[derive(Debug, Clone)]
pub struct SqliteGraphStore {
    pool: SqlitePool,
}

impl SqliteGraphStore {
    /// Create a graph store over a migrated pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ========== Read Operations ==========

    /// Count all nodes
    pub async fn count_nodes(&self) -> Result<u64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM graph_nodes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    /// Count all relationships
    pub async fn count_relationships(&self) -> Result<u64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM relationships")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    /// Find the node whose `name` property equals `name`
    pub async fn find_node(&self, name: &str) -> Result<Option<NodeId>, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT node_id FROM node_properties WHERE key = ? AND value = ? ORDER BY node_id LIMIT 1",
        )
        .bind(NAME_PROPERTY)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id,)| NodeId(id)))
    }

    /// Labels attached to a node, sorted
    pub async fn labels(&self, node: NodeId) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT label FROM node_labels WHERE node_id = ? ORDER BY label")
                .bind(node.0)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(label,)| label).collect())
    }

    /// Names of the nodes `node` points to through `rel_type`
    pub async fn parents(&self, node: NodeId, rel_type: &str) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT p.value FROM relationships r
            JOIN node_properties p ON p.node_id = r.end_node AND p.key = ?
            WHERE r.start_node = ? AND r.rel_type = ?
            ORDER BY r.id
            "#,
        )
        .bind(NAME_PROPERTY)
        .bind(node.0)
        .bind(rel_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Names of the nodes pointing to `node` through `rel_type`
    pub async fn children(&self, node: NodeId, rel_type: &str) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT p.value FROM relationships r
            JOIN node_properties p ON p.node_id = r.start_node AND p.key = ?
            WHERE r.end_node = ? AND r.rel_type = ?
            ORDER BY p.value
            "#,
        )
        .bind(NAME_PROPERTY)
        .bind(node.0)
        .bind(rel_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Sorted, comparable image of the whole graph
    pub async fn snapshot(&self) -> Result<GraphSnapshot, StoreError> {
        let node_rows: Vec<(i64, Option<String>)> = sqlx::query_as(
            r#"
            SELECT n.id, p.value
            FROM graph_nodes n
            LEFT JOIN node_properties p ON p.node_id = n.id AND p.key = ?
            "#,
        )
        .bind(NAME_PROPERTY)
        .fetch_all(&self.pool)
        .await?;

        let label_rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT node_id, label FROM node_labels ORDER BY node_id, label")
                .fetch_all(&self.pool)
                .await?;
        let mut labels_by_node: HashMap<i64, Vec<String>> = HashMap::new();
        for (node_id, label) in label_rows {
            labels_by_node.entry(node_id).or_default().push(label);
        }

        let mut nodes: Vec<SnapshotNode> = node_rows
            .into_iter()
            .map(|(id, name)| SnapshotNode {
                name: name.unwrap_or_else(|| format!("{}", NodeId(id))),
                labels: labels_by_node.remove(&id).unwrap_or_default(),
            })
            .collect();
        nodes.sort();

        let mut edges: Vec<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT s.value, e.value, r.rel_type
            FROM relationships r
            JOIN node_properties s ON s.node_id = r.start_node AND s.key = ?
            JOIN node_properties e ON e.node_id = r.end_node AND e.key = ?
            "#,
        )
        .bind(NAME_PROPERTY)
        .bind(NAME_PROPERTY)
        .fetch_all(&self.pool)
        .await?;
        edges.sort();

        Ok(GraphSnapshot { nodes, edges })
    }

    /// Aggregate counts of the store
    pub async fn stats(&self) -> Result<GraphStats, StoreError> {
        let total_nodes = self.count_nodes().await?;
        let total_relationships = self.count_relationships().await?;

        let (labelled_nodes,): (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT node_id) FROM node_labels")
                .fetch_one(&self.pool)
                .await?;

        let by_type: Vec<(String, i64)> = sqlx::query_as(
            "SELECT rel_type, COUNT(*) FROM relationships GROUP BY rel_type ORDER BY rel_type",
        )
        .fetch_all(&self.pool)
        .await?;

        let (duplicate_relationships,): (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(n - 1), 0) FROM (
                SELECT COUNT(*) AS n FROM relationships
                GROUP BY start_node, end_node, rel_type
            )
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(GraphStats {
            total_nodes,
            total_relationships,
            labelled_nodes: labelled_nodes as u64,
            relationships_by_type: by_type
                .into_iter()
                .map(|(t, n)| (t, n as u64))
                .collect(),
            duplicate_relationships: duplicate_relationships as u64,
        })
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn begin_transaction(&self) -> Result<Box<dyn GraphTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        debug!("Graph transaction opened");
        Ok(Box::new(SqliteGraphTransaction { tx }))
    }
}

/// Write transaction over the SQLite graph store
///
/// Wraps a [`sqlx::Transaction`], which rolls back when dropped uncommitted.
pub struct SqliteGraphTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl GraphTransaction for SqliteGraphTransaction {
    async fn get_or_create_unique_node(
        &mut self,
        index: &str,
        key: &str,
        value: &str,
        on_create: NodeInitializer<'_>,
    ) -> Result<UniqueNode, StoreError> {
        if index.trim().is_empty() || key.trim().is_empty() {
            return Err(StoreError::IndexFactory {
                index: index.to_string(),
                reason: "index name and key must not be empty".to_string(),
            });
        }

        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT node_id FROM unique_node_index WHERE index_name = ? AND key = ? AND value = ?",
        )
        .bind(index)
        .bind(key)
        .bind(value)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| index_error(index, e))?;

        if let Some((id,)) = existing {
            return Ok(UniqueNode {
                id: NodeId(id),
                created: false,
            });
        }

        let id = sqlx::query("INSERT INTO graph_nodes DEFAULT VALUES")
            .execute(&mut *self.tx)
            .await?
            .last_insert_rowid();

        sqlx::query(
            "INSERT INTO unique_node_index (index_name, key, value, node_id) VALUES (?, ?, ?, ?)",
        )
        .bind(index)
        .bind(key)
        .bind(value)
        .bind(id)
        .execute(&mut *self.tx)
        .await?;

        let mut properties = NodeProperties::new();
        on_create(&mut properties);
        for (prop_key, prop_value) in properties.iter() {
            sqlx::query("INSERT INTO node_properties (node_id, key, value) VALUES (?, ?, ?)")
                .bind(id)
                .bind(prop_key)
                .bind(prop_value)
                .execute(&mut *self.tx)
                .await?;
        }

        Ok(UniqueNode {
            id: NodeId(id),
            created: true,
        })
    }

    async fn add_label(&mut self, node: NodeId, label: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("INSERT OR IGNORE INTO node_labels (node_id, label) VALUES (?, ?)")
            .bind(node.0)
            .bind(label)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_relationship(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
    ) -> Result<RelationshipId, StoreError> {
        let id = sqlx::query(
            "INSERT INTO relationships (start_node, end_node, rel_type) VALUES (?, ?, ?)",
        )
        .bind(from.0)
        .bind(to.0)
        .bind(rel_type)
        .execute(&mut *self.tx)
        .await?
        .last_insert_rowid();

        debug!(%from, %to, rel_type, "Relationship created");
        Ok(RelationshipId(id))
    }

    async fn find_relationship(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
    ) -> Result<Option<RelationshipId>, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM relationships WHERE start_node = ? AND end_node = ? AND rel_type = ? LIMIT 1",
        )
        .bind(from.0)
        .bind(to.0)
        .bind(rel_type)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(|(id,)| RelationshipId(id)))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        info!("Graph transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        info!("Graph transaction rolled back");
        Ok(())
    }
}

/// A missing index table means the index was never initialized
fn index_error(index: &str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.message().contains("no such table") => {
            StoreError::IndexFactory {
                index: index.to_string(),
                reason: db.message().to_string(),
            }
        }
        _ => StoreError::Database(err),
    }
}

/// Node entry of a [`GraphSnapshot`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SnapshotNode {
    /// `name` property (or the node id when unnamed)
    pub name: String,
    pub labels: Vec<String>,
}

/// Order-independent image of a graph, for comparisons and export
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<SnapshotNode>,
    /// `(start name, end name, relationship type)`
    pub edges: Vec<(String, String, String)>,
}

/// Aggregate counts of a graph store
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphStats {
    pub total_nodes: u64,
    pub total_relationships: u64,
    pub labelled_nodes: u64,
    pub relationships_by_type: Vec<(String, u64)>,
    /// Relationships beyond the first between the same pair and type
    pub duplicate_relationships: u64,
}
