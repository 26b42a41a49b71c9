//! Import run summary

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pipeline::EdgePolicy;

/// Lifecycle of a single import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportState {
    NotStarted,
    ConsistencyChecked,
    TransactionOpen,
    Iterating,
    Committed,
    RolledBack,
    /// Terminal failure before any transaction was opened
    Failed,
}

impl ImportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::ConsistencyChecked => "consistency_checked",
            Self::TransactionOpen => "transaction_open",
            Self::Iterating => "iterating",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
            Self::Failed => "failed",
        }
    }

    /// Whether the run can no longer make progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack | Self::Failed)
    }

    /// Whether a transaction is open in this state
    pub fn holds_transaction(&self) -> bool {
        matches!(self, Self::TransactionOpen | Self::Iterating)
    }
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts and timing of a committed import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    /// Identifier of this run, also attached to its log span
    pub run_id: Uuid,
    /// Ontology document that was imported
    pub ontology_path: PathBuf,
    /// How existing `isA` edges were treated
    pub edge_policy: EdgePolicy,
    /// Classes walked from the ontology signature
    pub classes_processed: usize,
    /// Nodes created by this run (root included)
    pub nodes_created: usize,
    /// Nodes found already present in the store
    pub nodes_reused: usize,
    /// Class labels newly attached
    pub labels_added: usize,
    /// `isA` relationships created
    pub edges_created: usize,
    /// `isA` relationships left alone because they already existed
    pub edges_skipped: usize,
    /// Classes with no direct superclass, anchored to the root
    pub root_anchored: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ImportReport {
    pub(crate) fn start(run_id: Uuid, ontology_path: PathBuf, edge_policy: EdgePolicy) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            ontology_path,
            edge_policy,
            classes_processed: 0,
            nodes_created: 0,
            nodes_reused: 0,
            labels_added: 0,
            edges_created: 0,
            edges_skipped: 0,
            root_anchored: 0,
            started_at: now,
            finished_at: now,
        }
    }

    /// Wall-clock duration of the run in milliseconds
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Imported {}", self.ontology_path.display())?;
        writeln!(f, "  Classes processed: {}", self.classes_processed)?;
        writeln!(
            f,
            "  Nodes:             {} created, {} reused",
            self.nodes_created, self.nodes_reused
        )?;
        writeln!(f, "  Labels added:      {}", self.labels_added)?;
        writeln!(
            f,
            "  isA edges:         {} created, {} already present",
            self.edges_created, self.edges_skipped
        )?;
        writeln!(f, "  Anchored to root:  {}", self.root_anchored)?;
        write!(f, "  Duration:          {} ms", self.duration_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_classification() {
        assert!(ImportState::Committed.is_terminal());
        assert!(ImportState::Failed.is_terminal());
        assert!(!ImportState::Iterating.is_terminal());
        assert!(ImportState::Iterating.holds_transaction());
        assert!(!ImportState::ConsistencyChecked.holds_transaction());
    }

    #[test]
    fn test_report_serializes() {
        let report =
            ImportReport::start(Uuid::new_v4(), PathBuf::from("zoo.ttl"), EdgePolicy::Merge);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["edge_policy"], "merge");
        assert_eq!(json["classes_processed"], 0);
        assert!(report.duration_ms() >= 0);
    }

    #[test]
    fn test_report_display() {
        let mut report =
            ImportReport::start(Uuid::new_v4(), PathBuf::from("zoo.ttl"), EdgePolicy::Merge);
        report.classes_processed = 3;
        let text = report.to_string();
        assert!(text.contains("zoo.ttl"));
        assert!(text.contains("Classes processed: 3"));
    }
}
