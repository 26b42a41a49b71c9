//! Graph store infrastructure implementations
//!
//! This module contains the SQLite implementation of the graph store traits.

mod store;

pub use store::{GraphSnapshot, GraphStats, SnapshotNode, SqliteGraphStore, SqliteGraphTransaction};
