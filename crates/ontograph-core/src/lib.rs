//! Ontograph Core Library
//!
//! This crate imports the class hierarchy of an OWL ontology into a property
//! graph store, including:
//! - Ontology loading and structural reasoning (Turtle, N-Triples, RDF/XML)
//! - Identifier normalization and node deduplication
//! - A single-transaction import pipeline with rollback on failure
//! - Storage (SQLite graph store with versioned migrations)
//! - Configuration with file persistence

pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::import::{EdgePolicy, ImportPipeline, ImportReport};
    pub use crate::error::{Error, Result};
}
