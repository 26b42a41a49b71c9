//! Ontology import command

use std::path::Path;

use sqlx::SqlitePool;

use crate::domain::import::{EdgePolicy, ImportPipeline, ImportReport};
use crate::error::Result;
use crate::infrastructure::graph::SqliteGraphStore;
use crate::infrastructure::ontology::RdfOntologySource;

/// Import the class hierarchy of the document at `ontology_path` into the store
///
/// The whole run is one transaction: on failure nothing is written.
pub async fn run(
    pool: &SqlitePool,
    ontology_path: &Path,
    edge_policy: EdgePolicy,
) -> Result<ImportReport> {
    let store = SqliteGraphStore::new(pool.clone());
    let pipeline = ImportPipeline::new(ontology_path).with_edge_policy(edge_policy);

    let report = pipeline.run(&RdfOntologySource::new(), &store).await?;
    Ok(report)
}
