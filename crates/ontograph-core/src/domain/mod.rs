//! Domain layer
//!
//! Contains the import pipeline and the boundaries it talks through.

pub mod graph;
pub mod import;
pub mod ontology;
