//! Graph store traits
//!
//! This module defines the primitives the importer needs from a property
//! graph store. The traits abstract over different backends (SQLite, etc.).

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Handle to a node inside a graph store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a relationship inside a graph store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(pub i64);

/// Result of a get-or-create against a unique index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueNode {
    /// The node mapped to the index entry
    pub id: NodeId,
    /// Whether this call created the node
    pub created: bool,
}

/// Properties written to a node when it is first created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeProperties(BTreeMap<String, String>);

impl NodeProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Initialization hook run exactly once, when a unique node is created
pub type NodeInitializer<'a> = &'a (dyn Fn(&mut NodeProperties) + Send + Sync);

/// A property graph store that hands out transactions
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Open a new write transaction
    async fn begin_transaction(&self) -> Result<Box<dyn GraphTransaction>, StoreError>;
}

/// An open write transaction
///
/// Nothing written through a transaction is visible to other observers until
/// [`commit`](GraphTransaction::commit). Dropping a transaction without
/// committing rolls it back.
#[async_trait]
pub trait GraphTransaction: Send {
    /// Return the node mapped to `key = value` in the unique index `index`,
    /// creating it (and running `on_create`) if no such entry exists yet
    async fn get_or_create_unique_node(
        &mut self,
        index: &str,
        key: &str,
        value: &str,
        on_create: NodeInitializer<'_>,
    ) -> Result<UniqueNode, StoreError>;

    /// Attach a label to a node; returns `false` if it was already present
    async fn add_label(&mut self, node: NodeId, label: &str) -> Result<bool, StoreError>;

    /// Create a directed relationship `from -[rel_type]-> to`
    async fn create_relationship(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
    ) -> Result<RelationshipId, StoreError>;

    /// Find an existing relationship `from -[rel_type]-> to`
    async fn find_relationship(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
    ) -> Result<Option<RelationshipId>, StoreError>;

    /// Make every write of this transaction durable
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard every write of this transaction
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
