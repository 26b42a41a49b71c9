//! Ontology domain module
//!
//! Class references, their canonical identifiers, and the traits an ontology
//! source and its reasoner implement.

mod identifier;
mod source;

pub use identifier::{ClassIdentifier, ROOT_IDENTIFIER, normalize};
pub use source::{ClassRef, OntologyModel, OntologySource};
