//! Graph inspection commands
//!
//! Read-only views over an imported class hierarchy.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::domain::graph::IS_A;
use crate::error::{Error, Result};
use crate::infrastructure::graph::{GraphStats, SqliteGraphStore};

/// A single class node with its hierarchy neighbours
#[derive(Debug, Clone, Serialize)]
pub struct NodeDetails {
    /// Canonical class name
    pub name: String,
    /// Labels on the node
    pub labels: Vec<String>,
    /// Direct superclasses (targets of outgoing `isA` edges)
    pub parents: Vec<String>,
    /// Direct subclasses (sources of incoming `isA` edges)
    pub children: Vec<String>,
}

/// Get graph store statistics
pub async fn get_stats(pool: &SqlitePool) -> Result<GraphStats> {
    let store = SqliteGraphStore::new(pool.clone());
    Ok(store.stats().await?)
}

/// Get a node by name with its labels, parents and children
pub async fn get_node_details(pool: &SqlitePool, name: &str) -> Result<NodeDetails> {
    let store = SqliteGraphStore::new(pool.clone());

    let node = store
        .find_node(name)
        .await?
        .ok_or_else(|| Error::NodeNotFound(name.to_string()))?;

    Ok(NodeDetails {
        name: name.to_string(),
        labels: store.labels(node).await?,
        parents: store.parents(node, IS_A).await?,
        children: store.children(node, IS_A).await?,
    })
}
