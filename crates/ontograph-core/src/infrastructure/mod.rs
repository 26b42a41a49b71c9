//! Infrastructure layer
//!
//! Contains implementations of the domain traits over SQLite and RDF parsers.

pub mod graph;
pub mod ontology;
