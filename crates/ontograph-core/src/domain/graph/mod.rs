//! Property graph domain module
//!
//! - **GraphStore / GraphTransaction**: the store primitives the importer uses
//! - **NodeRegistry**: get-or-create of class nodes keyed by canonical name
//!
//! Labels and relationship types are open strings: class names are unbounded,
//! and the hierarchy relationship is the `isA` tag.

mod registry;
mod store;

pub use registry::NodeRegistry;
pub use store::{
    GraphStore, GraphTransaction, NodeId, NodeInitializer, NodeProperties, RelationshipId,
    UniqueNode,
};

/// Unique index the importer keys class nodes on
pub const UNIQUE_NODE_INDEX: &str = "index";

/// Node property holding the canonical class identifier
pub const NAME_PROPERTY: &str = "name";

/// Relationship type of hierarchy edges
pub const IS_A: &str = "isA";
