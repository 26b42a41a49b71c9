//! Deduplicating node registry
//!
//! Maps canonical class identifiers to graph nodes through the store's
//! unique index on the `name` property.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::ontology::ClassIdentifier;
use crate::error::StoreError;

use super::store::{GraphTransaction, NodeId, NodeProperties};
use super::{NAME_PROPERTY, UNIQUE_NODE_INDEX};

/// Get-or-create layer over [`GraphTransaction::get_or_create_unique_node`]
///
/// The store's unique index guarantees one node per identifier; the registry
/// only remembers what it has already resolved during the current run.
#[derive(Debug)]
pub struct NodeRegistry {
    index: String,
    resolved: HashMap<ClassIdentifier, NodeId>,
    created: usize,
    reused: usize,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    /// Registry over the default `index` unique index
    pub fn new() -> Self {
        Self::with_index(UNIQUE_NODE_INDEX)
    }

    /// Registry over a named unique index
    pub fn with_index(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            resolved: HashMap::new(),
            created: 0,
            reused: 0,
        }
    }

    /// Return the node for `identifier`, creating it on first use
    ///
    /// A newly created node gets its `name` property set to the identifier.
    /// Labels are left to the caller.
    pub async fn get_or_create(
        &mut self,
        tx: &mut dyn GraphTransaction,
        identifier: &ClassIdentifier,
    ) -> Result<NodeId, StoreError> {
        if let Some(node) = self.resolved.get(identifier) {
            return Ok(*node);
        }

        let name = identifier.as_str().to_string();
        let init = move |props: &mut NodeProperties| props.set(NAME_PROPERTY, name.clone());

        let node = tx
            .get_or_create_unique_node(&self.index, NAME_PROPERTY, identifier.as_str(), &init)
            .await?;

        if node.created {
            self.created += 1;
            debug!(name = %identifier, node = %node.id, "Node created");
        } else {
            self.reused += 1;
            debug!(name = %identifier, node = %node.id, "Existing node reused");
        }

        self.resolved.insert(identifier.clone(), node.id);
        Ok(node.id)
    }

    /// Nodes created by this registry
    pub fn created(&self) -> usize {
        self.created
    }

    /// Nodes that already existed in the store before this run touched them
    pub fn reused(&self) -> usize {
        self.reused
    }

    /// Distinct identifiers resolved so far
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}
