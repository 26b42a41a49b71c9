//! Integration tests for the ontology import pipeline
//!
//! These exercise the pipeline against real SQLite stores and parsed
//! documents, plus store and ontology doubles that fail on demand.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ontograph_core::domain::graph::{
    GraphStore, GraphTransaction, IS_A, NodeId, NodeInitializer, RelationshipId, UniqueNode,
};
use ontograph_core::domain::import::{EdgePolicy, ImportPipeline};
use ontograph_core::domain::ontology::{ClassRef, OntologyModel, OntologySource};
use ontograph_core::error::{ImportError, OntologyError, StoreError};
use ontograph_core::infrastructure::graph::{GraphSnapshot, SqliteGraphStore};
use ontograph_core::infrastructure::ontology::RdfOntologySource;
use ontograph_core::storage::Database;
use tempfile::TempDir;

const ZOO: &str = r#"
@prefix : <http://ex.org/zoo#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

:Animal a owl:Class .
:Mammal a owl:Class ; rdfs:subClassOf :Animal .
:Bird a owl:Class ; rdfs:subClassOf :Animal .
:Flyer a owl:Class .
:Bat a owl:Class ; rdfs:subClassOf :Mammal, :Flyer .
:Plant a owl:Class ; owl:disjointWith :Animal .
"#;

fn write_ontology(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

async fn memory_store() -> SqliteGraphStore {
    let db = Database::in_memory().await.expect("Failed to create database");
    SqliteGraphStore::new(db.pool().clone())
}

// ========== Test doubles ==========

/// Ontology given as class name -> direct superclass names
#[derive(Clone)]
struct TableOntology {
    classes: Vec<(&'static str, Vec<&'static str>)>,
    failing_class: Option<&'static str>,
}

fn iri(name: &str) -> ClassRef {
    ClassRef::from_iri(&format!("http://ex.org/zoo#{name}"))
}

impl OntologySource for TableOntology {
    type Model = TableOntology;

    fn load(&self, _path: &Path) -> Result<Self::Model, OntologyError> {
        Ok(self.clone())
    }
}

impl OntologyModel for TableOntology {
    fn is_consistent(&self) -> bool {
        true
    }

    fn class_signature(&self) -> Result<Vec<ClassRef>, OntologyError> {
        Ok(self.classes.iter().map(|(name, _)| iri(name)).collect())
    }

    fn direct_superclasses(&self, class: &ClassRef) -> Result<Vec<ClassRef>, OntologyError> {
        if self.failing_class.is_some_and(|name| iri(name) == *class) {
            return Err(OntologyError::Query(format!("reasoner crashed on {class}")));
        }

        let supers: HashMap<ClassRef, Vec<ClassRef>> = self
            .classes
            .iter()
            .map(|(name, parents)| (iri(name), parents.iter().map(|p| iri(p)).collect()))
            .collect();
        Ok(supers.get(class).cloned().unwrap_or_default())
    }
}

/// Store whose transactions fail after a fixed number of writes
struct FaultyStore {
    inner: SqliteGraphStore,
    writes_before_failure: usize,
    transactions: Arc<AtomicUsize>,
}

impl FaultyStore {
    fn new(inner: SqliteGraphStore, writes_before_failure: usize) -> Self {
        Self {
            inner,
            writes_before_failure,
            transactions: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl GraphStore for FaultyStore {
    async fn begin_transaction(&self) -> Result<Box<dyn GraphTransaction>, StoreError> {
        self.transactions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FaultyTransaction {
            inner: self.inner.begin_transaction().await?,
            remaining: self.writes_before_failure,
        }))
    }
}

struct FaultyTransaction {
    inner: Box<dyn GraphTransaction>,
    remaining: usize,
}

impl FaultyTransaction {
    fn tick(&mut self) -> Result<(), StoreError> {
        if self.remaining == 0 {
            return Err(StoreError::Database(sqlx::Error::Protocol(
                "injected write failure".to_string(),
            )));
        }
        self.remaining -= 1;
        Ok(())
    }
}

#[async_trait]
impl GraphTransaction for FaultyTransaction {
    async fn get_or_create_unique_node(
        &mut self,
        index: &str,
        key: &str,
        value: &str,
        on_create: NodeInitializer<'_>,
    ) -> Result<UniqueNode, StoreError> {
        self.tick()?;
        self.inner
            .get_or_create_unique_node(index, key, value, on_create)
            .await
    }

    async fn add_label(&mut self, node: NodeId, label: &str) -> Result<bool, StoreError> {
        self.tick()?;
        self.inner.add_label(node, label).await
    }

    async fn create_relationship(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
    ) -> Result<RelationshipId, StoreError> {
        self.tick()?;
        self.inner.create_relationship(from, to, rel_type).await
    }

    async fn find_relationship(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
    ) -> Result<Option<RelationshipId>, StoreError> {
        self.inner.find_relationship(from, to, rel_type).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.rollback().await
    }
}

// ========== End-to-end ==========

#[tokio::test]
async fn test_import_turtle_document_into_file_store() {
    let dir = TempDir::new().unwrap();
    let ontology = write_ontology(&dir, "zoo.ttl", ZOO);
    let db = Database::open(dir.path().join("graph.db"))
        .await
        .expect("Failed to open database");
    let store = SqliteGraphStore::new(db.pool().clone());

    let report = ImportPipeline::new(&ontology)
        .run(&RdfOntologySource::new(), &store)
        .await
        .expect("Import failed");

    assert_eq!(report.classes_processed, 6);
    // Six classes and the root
    assert_eq!(report.nodes_created, 7);
    assert_eq!(report.root_anchored, 3);

    let bat = store.find_node("Bat").await.unwrap().unwrap();
    assert_eq!(store.labels(bat).await.unwrap(), vec!["Bat".to_string()]);
    let mut parents = store.parents(bat, IS_A).await.unwrap();
    parents.sort();
    assert_eq!(parents, vec!["Flyer".to_string(), "Mammal".to_string()]);

    let root = store.find_node("owl:Thing").await.unwrap().unwrap();
    assert!(store.labels(root).await.unwrap().is_empty());
    assert_eq!(
        store.children(root, IS_A).await.unwrap(),
        vec!["Animal".to_string(), "Flyer".to_string(), "Plant".to_string()]
    );

    db.close().await;
}

#[tokio::test]
async fn test_rerun_with_merge_leaves_graph_unchanged() {
    let dir = TempDir::new().unwrap();
    let ontology = write_ontology(&dir, "zoo.ttl", ZOO);
    let store = memory_store().await;
    let pipeline = ImportPipeline::new(&ontology);

    pipeline.run(&RdfOntologySource::new(), &store).await.unwrap();
    let first = store.snapshot().await.unwrap();

    let report = pipeline.run(&RdfOntologySource::new(), &store).await.unwrap();
    let second = store.snapshot().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(report.nodes_created, 0);
    assert_eq!(report.nodes_reused, 7);
    assert_eq!(report.edges_created, 0);
    assert_eq!(report.labels_added, 0);
    assert_eq!(store.stats().await.unwrap().duplicate_relationships, 0);
}

#[tokio::test]
async fn test_rerun_with_append_duplicates_edges_only() {
    let dir = TempDir::new().unwrap();
    let ontology = write_ontology(&dir, "zoo.ttl", ZOO);
    let store = memory_store().await;
    let pipeline = ImportPipeline::new(&ontology).with_edge_policy(EdgePolicy::Append);

    let first = pipeline.run(&RdfOntologySource::new(), &store).await.unwrap();
    pipeline.run(&RdfOntologySource::new(), &store).await.unwrap();

    assert_eq!(store.count_nodes().await.unwrap(), 7);
    assert_eq!(
        store.count_relationships().await.unwrap(),
        2 * first.edges_created as u64
    );
}

#[tokio::test]
async fn test_class_named_like_root_in_other_namespace_is_distinct() {
    let dir = TempDir::new().unwrap();
    let ontology = write_ontology(
        &dir,
        "things.ttl",
        r#"
        @prefix : <http://ex.org/zoo#> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        :Thing rdfs:subClassOf :Entity .
        "#,
    );
    let store = memory_store().await;

    ImportPipeline::new(&ontology)
        .run(&RdfOntologySource::new(), &store)
        .await
        .unwrap();

    let thing = store.find_node("Thing").await.unwrap().unwrap();
    let root = store.find_node("owl:Thing").await.unwrap().unwrap();
    assert_ne!(thing, root);
    assert_eq!(
        store.parents(thing, IS_A).await.unwrap(),
        vec!["Entity".to_string()]
    );
}

// ========== Failure atomicity ==========

#[tokio::test]
async fn test_inconsistent_document_never_opens_transaction() {
    let dir = TempDir::new().unwrap();
    let ontology = write_ontology(
        &dir,
        "clash.ttl",
        &format!("{ZOO}\n:venus a :Plant , :Animal .\n"),
    );
    let store = FaultyStore::new(memory_store().await, usize::MAX);

    let err = ImportPipeline::new(&ontology)
        .run(&RdfOntologySource::new(), &store)
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Inconsistent { .. }));
    let message = err.to_string();
    assert!(message.contains("venus"), "reason should name the individual: {message}");
    assert!(message.contains("disjoint classes"));
    assert!(message.contains("No graph writes were made"));
    assert!(!err.rolled_back());
    assert_eq!(store.transactions.load(Ordering::SeqCst), 0);
    assert_eq!(store.inner.snapshot().await.unwrap(), GraphSnapshot::default());
}

#[tokio::test]
async fn test_store_failure_mid_run_rolls_back() {
    let dir = TempDir::new().unwrap();
    let ontology = write_ontology(&dir, "zoo.ttl", ZOO);
    let inner = memory_store().await;

    // Seed the store so rollback must restore existing content too
    ImportPipeline::new(write_ontology(
        &dir,
        "seed.ttl",
        "<http://ex.org/zoo#Mammal> <http://www.w3.org/2000/01/rdf-schema#subClassOf> <http://ex.org/zoo#Animal> .\n",
    ))
    .run(&RdfOntologySource::new(), &inner)
    .await
    .unwrap();
    let before = inner.snapshot().await.unwrap();

    for writes in [0, 1, 3, 8, 15] {
        let store = FaultyStore::new(inner.clone(), writes);
        let err = ImportPipeline::new(&ontology)
            .run(&RdfOntologySource::new(), &store)
            .await
            .unwrap_err();

        assert!(
            matches!(err, ImportError::StoreWrite(StoreError::Database(_))),
            "unexpected error after {writes} writes: {err}"
        );
        assert!(err.rolled_back());
        assert_eq!(inner.snapshot().await.unwrap(), before, "after {writes} writes");
    }
}

#[tokio::test]
async fn test_reasoner_failure_mid_run_rolls_back() {
    let store = memory_store().await;
    let ontology = TableOntology {
        classes: vec![("A", vec![]), ("B", vec!["A"]), ("C", vec!["B"])],
        failing_class: Some("C"),
    };

    let err = ImportPipeline::new("zoo.ttl")
        .run(&ontology, &store)
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Reasoning(OntologyError::Query(_))));
    assert_eq!(err.code(), "E102");
    assert_eq!(store.count_nodes().await.unwrap(), 0);
    assert_eq!(store.count_relationships().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_document_fails_before_any_write() {
    let store = FaultyStore::new(memory_store().await, usize::MAX);

    let err = ImportPipeline::new("/nonexistent/zoo.ttl")
        .run(&RdfOntologySource::new(), &store)
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Load(OntologyError::NotFound(_))));
    assert_eq!(store.transactions.load(Ordering::SeqCst), 0);
}
