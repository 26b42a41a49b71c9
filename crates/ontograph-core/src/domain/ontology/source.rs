//! Ontology source traits
//!
//! An [`OntologySource`] loads a document into an [`OntologyModel`], which
//! answers the three questions the importer asks of a reasoner.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OntologyError;

/// Opaque reference to an ontology class in its external textual form
///
/// For IRIs this is the bracketed rendering, e.g. `<http://ex.org/onto#Animal>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassRef(String);

impl ClassRef {
    pub fn new(rendered: impl Into<String>) -> Self {
        Self(rendered.into())
    }

    /// Reference for a named IRI, rendered as `<iri>`
    pub fn from_iri(iri: &str) -> Self {
        Self(format!("<{iri}>"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loads ontology documents
pub trait OntologySource {
    type Model: OntologyModel;

    /// Load and parse the document at `path`
    fn load(&self, path: &Path) -> Result<Self::Model, OntologyError>;
}

/// A loaded ontology together with its reasoner
pub trait OntologyModel {
    /// Whether the ontology is logically consistent
    fn is_consistent(&self) -> bool;

    /// Human-readable cause of an inconsistency, when the reasoner knows it
    fn inconsistency_reason(&self) -> Option<String> {
        None
    }

    /// All classes appearing in the ontology's signature
    fn class_signature(&self) -> Result<Vec<ClassRef>, OntologyError>;

    /// Direct (non-transitive) named superclasses of `class`
    ///
    /// Top-level classes return an empty set; the root class is never listed.
    fn direct_superclasses(&self, class: &ClassRef) -> Result<Vec<ClassRef>, OntologyError>;
}
