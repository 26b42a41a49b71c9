//! Ontology import domain module
//!
//! ```text
//! load → consistency gate → begin tx → root node → for each class:
//!     normalize → get-or-create + label → direct superclasses → isA edges
//! → commit   (any failure after begin → rollback)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ontograph_core::domain::import::ImportPipeline;
//! use ontograph_core::infrastructure::graph::SqliteGraphStore;
//! use ontograph_core::infrastructure::ontology::RdfOntologySource;
//!
//! let store = SqliteGraphStore::new(db.pool().clone());
//! let report = ImportPipeline::new("zoo.ttl")
//!     .run(&RdfOntologySource::new(), &store)
//!     .await?;
//! println!("{report}");
//! ```

mod pipeline;
mod report;

pub use pipeline::{EdgePolicy, ImportPipeline};
pub use report::{ImportReport, ImportState};
