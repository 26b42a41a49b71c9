//! Ontology source implementations
//!
//! Parses OWL documents (Turtle, N-Triples, RDF/XML) and answers hierarchy
//! queries with a structural reasoner.

mod rdf;
mod reasoner;
pub mod vocab;

pub use rdf::{DocumentFormat, RdfOntologySource};
pub use reasoner::RdfOntology;
