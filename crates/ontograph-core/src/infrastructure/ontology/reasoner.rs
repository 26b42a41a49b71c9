//! Structural reasoner over a parsed OWL class hierarchy
//!
//! Covers the told-subsumption fragment: `rdfs:subClassOf` and
//! `owl:equivalentClass` between named classes, `owl:disjointWith`, and class
//! assertions. Complex class expressions (restrictions, unions) are not
//! expanded; a class related only to a blank node keeps its named supers.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use oxrdf::{Term, Triple};
use tracing::debug;

use crate::domain::ontology::{ClassRef, OntologyModel};
use crate::error::OntologyError;

use super::vocab::{
    OWL_CLASS, OWL_DISJOINT_WITH, OWL_EQUIVALENT_CLASS, OWL_NOTHING, OWL_THING, RDFS_CLASS,
    RDFS_SUBCLASS_OF, RDF_TYPE, is_boundary_class, is_builtin,
};

/// Accumulates the hierarchy-relevant triples of a document
#[derive(Debug, Default)]
pub(crate) struct OntologyBuilder {
    classes: BTreeSet<String>,
    told: BTreeMap<String, BTreeSet<String>>,
    disjoint: Vec<(String, String)>,
    instances: BTreeMap<String, BTreeSet<String>>,
    triples: usize,
}

impl OntologyBuilder {
    pub(crate) fn add(&mut self, triple: Triple) {
        self.triples += 1;
        let subject = Term::from(triple.subject);
        let object = triple.object;

        match triple.predicate.as_str() {
            RDF_TYPE => self.add_type(&subject, &object),
            RDFS_SUBCLASS_OF => {
                if let Some(sub) = named(&subject) {
                    self.declare(sub);
                    if let Some(sup) = named(&object) {
                        self.declare(sup);
                        self.tell(sub, sup);
                    }
                }
            }
            OWL_EQUIVALENT_CLASS => {
                if let Some(left) = named(&subject) {
                    self.declare(left);
                    if let Some(right) = named(&object) {
                        self.declare(right);
                        self.tell(left, right);
                        self.tell(right, left);
                    }
                }
            }
            OWL_DISJOINT_WITH => {
                if let (Some(left), Some(right)) = (named(&subject), named(&object)) {
                    self.declare(left);
                    self.declare(right);
                    self.disjoint.push((left.to_string(), right.to_string()));
                }
            }
            _ => {}
        }
    }

    fn add_type(&mut self, subject: &Term, object: &Term) {
        let Some(class) = named(object) else {
            return;
        };

        if class == OWL_CLASS || class == RDFS_CLASS {
            if let Some(declared) = named(subject) {
                self.declare(declared);
            }
            return;
        }

        if class == OWL_NOTHING || !is_builtin(class) {
            self.declare(class);
            if let Some(individual) = resource_key(subject) {
                self.instances
                    .entry(individual)
                    .or_default()
                    .insert(class.to_string());
            }
        }
    }

    fn declare(&mut self, iri: &str) {
        if !is_boundary_class(iri) {
            self.classes.insert(iri.to_string());
        }
    }

    fn tell(&mut self, sub: &str, sup: &str) {
        if sub != sup && sup != OWL_THING {
            self.told
                .entry(sub.to_string())
                .or_default()
                .insert(sup.to_string());
        }
    }

    pub(crate) fn build(self) -> RdfOntology {
        let mut ancestors = BTreeMap::new();
        for class in self.classes.iter().chain(self.told.keys()) {
            if !ancestors.contains_key(class) {
                ancestors.insert(class.clone(), closure(&self.told, class));
            }
        }

        let mut ontology = RdfOntology {
            classes: self.classes,
            ancestors,
            disjoint: self.disjoint,
            instances: self.instances,
            inconsistency: None,
        };
        ontology.inconsistency = ontology.find_clash();

        debug!(
            triples = self.triples,
            classes = ontology.classes.len(),
            consistent = ontology.inconsistency.is_none(),
            "Ontology model built"
        );
        ontology
    }
}

/// Reflexive-transitive closure of the told hierarchy from `start`
fn closure(told: &BTreeMap<String, BTreeSet<String>>, start: &str) -> BTreeSet<String> {
    let mut seen = BTreeSet::from([start.to_string()]);
    let mut queue = VecDeque::from([start.to_string()]);

    while let Some(current) = queue.pop_front() {
        if let Some(supers) = told.get(&current) {
            for sup in supers {
                if seen.insert(sup.clone()) {
                    queue.push_back(sup.clone());
                }
            }
        }
    }
    seen
}

fn named(term: &Term) -> Option<&str> {
    match term {
        Term::NamedNode(node) => Some(node.as_str()),
        _ => None,
    }
}

fn resource_key(term: &Term) -> Option<String> {
    match term {
        Term::NamedNode(node) => Some(node.as_str().to_string()),
        Term::BlankNode(node) => Some(format!("_:{}", node.as_str())),
        _ => None,
    }
}

/// A loaded OWL document with its precomputed class hierarchy
#[derive(Debug, Clone)]
pub struct RdfOntology {
    classes: BTreeSet<String>,
    ancestors: BTreeMap<String, BTreeSet<String>>,
    disjoint: Vec<(String, String)>,
    instances: BTreeMap<String, BTreeSet<String>>,
    inconsistency: Option<String>,
}

impl RdfOntology {
    /// Number of classes in the signature
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    fn ancestors_of(&self, iri: &str) -> BTreeSet<String> {
        self.ancestors
            .get(iri)
            .cloned()
            .unwrap_or_else(|| BTreeSet::from([iri.to_string()]))
    }

    fn subsumes(&self, sup: &str, sub: &str) -> bool {
        self.ancestors
            .get(sub)
            .is_some_and(|ancestors| ancestors.contains(sup))
    }

    fn equivalent(&self, left: &str, right: &str) -> bool {
        self.subsumes(left, right) && self.subsumes(right, left)
    }

    fn strictly_below(&self, sub: &str, sup: &str) -> bool {
        self.subsumes(sup, sub) && !self.subsumes(sub, sup)
    }

    fn find_clash(&self) -> Option<String> {
        for (individual, types) in &self.instances {
            let mut inferred = BTreeSet::new();
            for class in types {
                inferred.extend(self.ancestors_of(class));
            }

            if inferred.contains(OWL_NOTHING) {
                return Some(format!("{individual} is an instance of owl:Nothing"));
            }

            if let Some((left, right)) = self
                .disjoint
                .iter()
                .find(|(left, right)| inferred.contains(left) && inferred.contains(right))
            {
                return Some(format!(
                    "{individual} is an instance of disjoint classes {left} and {right}"
                ));
            }
        }
        None
    }
}

impl OntologyModel for RdfOntology {
    fn is_consistent(&self) -> bool {
        self.inconsistency.is_none()
    }

    fn inconsistency_reason(&self) -> Option<String> {
        self.inconsistency.clone()
    }

    fn class_signature(&self) -> Result<Vec<ClassRef>, OntologyError> {
        Ok(self.classes.iter().map(|iri| ClassRef::from_iri(iri)).collect())
    }

    fn direct_superclasses(&self, class: &ClassRef) -> Result<Vec<ClassRef>, OntologyError> {
        let iri = class
            .as_str()
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
            .ok_or_else(|| OntologyError::Query(format!("'{class}' is not a named class")))?;

        let Some(ancestors) = self.ancestors.get(iri) else {
            return Err(OntologyError::Query(format!(
                "{class} is not in the ontology signature"
            )));
        };

        let strict: Vec<&String> = ancestors
            .iter()
            .filter(|sup| {
                sup.as_str() != iri && !is_boundary_class(sup) && !self.equivalent(iri, sup)
            })
            .collect();

        let direct = strict
            .iter()
            .filter(|sup| {
                !strict
                    .iter()
                    .any(|other| other != *sup && self.strictly_below(other, sup))
            })
            .map(|sup| ClassRef::from_iri(sup))
            .collect();

        Ok(direct)
    }
}
