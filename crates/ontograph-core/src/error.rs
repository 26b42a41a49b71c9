//! Error types for Ontograph

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using Ontograph's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by an ontology source or its reasoner
#[derive(Error, Debug)]
pub enum OntologyError {
    #[error("Ontology document '{0}' not found.")]
    NotFound(PathBuf),

    #[error("Failed to read ontology document '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported ontology format '{0}'. Supported extensions: ttl, nt, owl, rdf, xml.")]
    UnsupportedFormat(String),

    #[error("Malformed ontology document '{path}': {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Reasoner query failed: {0}")]
    Query(String),
}

/// Failures raised by a graph store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unique index '{index}' could not be initialized: {reason}")]
    IndexFactory { index: String, reason: String },

    #[error("Node {0} does not exist in the graph store")]
    NodeNotFound(i64),
}

/// The single typed failure returned by an import run
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to load ontology: {0}")]
    Load(#[source] OntologyError),

    #[error("Ontology '{}' is inconsistent: {reason}. No graph writes were made.", path.display())]
    Inconsistent { path: PathBuf, reason: String },

    #[error("Reasoner failed during import: {0}")]
    Reasoning(#[source] OntologyError),

    #[error("Graph store write failed: {0}")]
    StoreWrite(#[from] StoreError),
}

impl ImportError {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::Load(_) => "E100",
            Self::Inconsistent { .. } => "E101",
            Self::Reasoning(_) => "E102",
            Self::StoreWrite(StoreError::IndexFactory { .. }) => "E401",
            Self::StoreWrite(_) => "E400",
        }
    }

    /// Whether the failure happened after the transaction was opened
    pub fn rolled_back(&self) -> bool {
        matches!(self, Self::Reasoning(_) | Self::StoreWrite(_))
    }
}

/// Ontograph error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Import errors (E100-E499)
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    // Lookup errors (E500-E599)
    #[error("Node '{0}' not found. Run `ontograph stats` to inspect the store.")]
    NodeNotFound(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::Import(e) => e.code(),
            Self::Store(StoreError::IndexFactory { .. }) => "E401",
            Self::Store(_) => "E400",
            Self::NodeNotFound(_) => "E500",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Other(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Import(ImportError::Load(OntologyError::NotFound(path))) => {
                Some(format!("Check the ontology path: {}", path.display()))
            }
            Self::Import(ImportError::Load(OntologyError::UnsupportedFormat(_))) => {
                Some("Convert the ontology to Turtle (.ttl) or RDF/XML (.owl)".to_string())
            }
            Self::Import(ImportError::Inconsistent { .. }) => {
                Some("Correct the ontology's disjointness axioms and re-run the import".to_string())
            }
            Self::Import(ImportError::StoreWrite(_)) | Self::Store(_) => {
                Some("ontograph doctor".to_string())
            }
            Self::NodeNotFound(_) => Some("ontograph stats".to_string()),
            Self::ConfigError(_) => Some("ontograph config reset".to_string()),
            _ => None,
        }
    }
}
