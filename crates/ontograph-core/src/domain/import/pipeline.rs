//! Ontology import pipeline
//!
//! Walks an ontology's class signature and writes one node per class plus
//! `isA` edges to its direct superclasses into a graph store, all inside a
//! single transaction.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::domain::graph::{GraphStore, GraphTransaction, IS_A, NodeId, NodeRegistry};
use crate::domain::ontology::{ClassIdentifier, OntologyModel, OntologySource, normalize};
use crate::error::{ImportError, StoreError};

use super::report::{ImportReport, ImportState};

/// How `isA` edges that already exist in the store are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    /// Reuse an existing `from -[isA]-> to` edge instead of adding another
    #[default]
    Merge,
    /// Always create the edge, even if an identical one exists
    Append,
}

impl EdgePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Append => "append",
        }
    }
}

impl fmt::Display for EdgePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "append" => Ok(Self::Append),
            other => Err(format!(
                "Invalid edge policy: {}. Valid options: merge, append",
                other
            )),
        }
    }
}

/// Imports one ontology document into a graph store
#[derive(Debug, Clone)]
pub struct ImportPipeline {
    ontology_path: PathBuf,
    edge_policy: EdgePolicy,
}

impl ImportPipeline {
    /// Create a pipeline for the document at `ontology_path`
    pub fn new(ontology_path: impl Into<PathBuf>) -> Self {
        Self {
            ontology_path: ontology_path.into(),
            edge_policy: EdgePolicy::default(),
        }
    }

    /// Set the edge policy
    pub fn with_edge_policy(mut self, edge_policy: EdgePolicy) -> Self {
        self.edge_policy = edge_policy;
        self
    }

    pub fn ontology_path(&self) -> &Path {
        &self.ontology_path
    }

    pub fn edge_policy(&self) -> EdgePolicy {
        self.edge_policy
    }

    /// Run the import
    ///
    /// On success every node and edge is committed at once. On any failure
    /// the store is left exactly as it was before the run; an inconsistent
    /// ontology fails before a transaction is ever opened.
    pub async fn run<S>(
        &self,
        source: &S,
        store: &dyn GraphStore,
    ) -> Result<ImportReport, ImportError>
    where
        S: OntologySource,
    {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "import",
            %run_id,
            ontology = %self.ontology_path.display(),
            edge_policy = %self.edge_policy
        );

        self.execute(run_id, source, store).instrument(span).await
    }

    async fn execute<S>(
        &self,
        run_id: Uuid,
        source: &S,
        store: &dyn GraphStore,
    ) -> Result<ImportReport, ImportError>
    where
        S: OntologySource,
    {
        let mut state = ImportState::NotStarted;
        let mut report = ImportReport::start(run_id, self.ontology_path.clone(), self.edge_policy);

        let model = match source.load(&self.ontology_path) {
            Ok(model) => model,
            Err(e) => {
                enter(&mut state, ImportState::Failed);
                warn!(error = %e, "Failed to load ontology");
                return Err(ImportError::Load(e));
            }
        };

        if !model.is_consistent() {
            enter(&mut state, ImportState::Failed);
            let reason = model
                .inconsistency_reason()
                .unwrap_or_else(|| "the reasoner gave no explanation".to_string());
            warn!(%reason, "Ontology is inconsistent, nothing was written");
            return Err(ImportError::Inconsistent {
                path: self.ontology_path.clone(),
                reason,
            });
        }
        enter(&mut state, ImportState::ConsistencyChecked);
        info!("Loaded ontology and it is consistent");

        let mut tx = store.begin_transaction().await?;
        enter(&mut state, ImportState::TransactionOpen);

        match self.populate(&model, tx.as_mut(), &mut state, &mut report).await {
            Ok(()) => {
                if let Err(e) = tx.commit().await {
                    enter(&mut state, ImportState::RolledBack);
                    warn!(error = %e, "Commit failed, transaction rolled back");
                    return Err(e.into());
                }
                enter(&mut state, ImportState::Committed);

                report.finished_at = Utc::now();
                info!(
                    classes = report.classes_processed,
                    nodes_created = report.nodes_created,
                    edges_created = report.edges_created,
                    duration_ms = report.duration_ms(),
                    "Finished loading ontology"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, failed_in = %state, "Import failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Explicit rollback failed, transaction discarded");
                }
                enter(&mut state, ImportState::RolledBack);
                Err(e)
            }
        }
    }

    async fn populate<M>(
        &self,
        model: &M,
        tx: &mut dyn GraphTransaction,
        state: &mut ImportState,
        report: &mut ImportReport,
    ) -> Result<(), ImportError>
    where
        M: OntologyModel,
    {
        let mut registry = NodeRegistry::new();
        let mut linked = HashSet::new();

        let root = registry.get_or_create(tx, &ClassIdentifier::root()).await?;
        debug!(node = %root, "Root node ready");

        let classes = model.class_signature().map_err(ImportError::Reasoning)?;
        enter(state, ImportState::Iterating);
        info!(classes = classes.len(), "Importing classes");

        for class in &classes {
            let identifier = normalize(class.as_str());
            if identifier.is_root() {
                debug!(class = %class, "Skipping root class in signature");
                continue;
            }

            debug!(class = %identifier, "Creating node");
            let class_node = registry.get_or_create(tx, &identifier).await?;
            if tx.add_label(class_node, identifier.as_str()).await? {
                report.labels_added += 1;
            }

            let superclasses = model
                .direct_superclasses(class)
                .map_err(ImportError::Reasoning)?;

            if superclasses.is_empty() {
                self.link(tx, class_node, root, &mut linked, report).await?;
                report.root_anchored += 1;
            } else {
                for superclass in &superclasses {
                    let parent = normalize(superclass.as_str());
                    let parent_node = registry.get_or_create(tx, &parent).await?;
                    self.link(tx, class_node, parent_node, &mut linked, report).await?;
                }
            }

            report.classes_processed += 1;
        }

        report.nodes_created = registry.created();
        report.nodes_reused = registry.reused();
        Ok(())
    }

    /// Add `from -[isA]-> to`
    ///
    /// Under [`EdgePolicy::Merge`] an edge left by an earlier run is reused.
    /// Edges written by this run (`linked`) never suppress another, so a
    /// class gets one edge per superclass reference.
    async fn link(
        &self,
        tx: &mut dyn GraphTransaction,
        from: NodeId,
        to: NodeId,
        linked: &mut HashSet<(NodeId, NodeId)>,
        report: &mut ImportReport,
    ) -> Result<(), StoreError> {
        if self.edge_policy == EdgePolicy::Merge
            && !linked.contains(&(from, to))
            && tx.find_relationship(from, to, IS_A).await?.is_some()
        {
            debug!(%from, %to, "isA edge already present");
            report.edges_skipped += 1;
            return Ok(());
        }

        tx.create_relationship(from, to, IS_A).await?;
        linked.insert((from, to));
        report.edges_created += 1;
        Ok(())
    }
}

fn enter(state: &mut ImportState, next: ImportState) {
    debug!(from = %state, to = %next, "Import state transition");
    *state = next;
}
