//! OWL document loading over the oxigraph parser family

use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use oxrdf::Triple;
use oxrdfxml::RdfXmlParser;
use oxttl::{NTriplesParser, TurtleParser};
use tracing::{debug, info, warn};

use crate::domain::ontology::OntologySource;
use crate::error::OntologyError;

use super::reasoner::{OntologyBuilder, RdfOntology};

/// Serializations understood by [`RdfOntologySource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Turtle,
    NTriples,
    RdfXml,
}

impl DocumentFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, OntologyError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "ttl" => Ok(Self::Turtle),
            "nt" => Ok(Self::NTriples),
            "owl" | "rdf" | "xml" => Ok(Self::RdfXml),
            other => Err(OntologyError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Turtle => "turtle",
            Self::NTriples => "n-triples",
            Self::RdfXml => "rdf/xml",
        }
    }
}

/// Loads OWL documents from disk into an [`RdfOntology`]
#[derive(Debug, Clone, Default)]
pub struct RdfOntologySource;

impl RdfOntologySource {
    pub fn new() -> Self {
        Self
    }

    /// Parse an already opened document
    ///
    /// `path` is used for the base IRI and error messages only.
    pub fn parse<R: Read>(
        &self,
        reader: R,
        format: DocumentFormat,
        path: &Path,
    ) -> Result<RdfOntology, OntologyError> {
        let base = base_iri(path);
        let mut builder = OntologyBuilder::default();

        match format {
            DocumentFormat::Turtle => {
                let parser = match TurtleParser::new().with_base_iri(&base) {
                    Ok(parser) => parser,
                    Err(e) => {
                        warn!(base = %base, error = %e, "Ignoring invalid base IRI");
                        TurtleParser::new()
                    }
                };
                collect(parser.for_reader(reader), &mut builder, path)?;
            }
            DocumentFormat::NTriples => {
                collect(NTriplesParser::new().for_reader(reader), &mut builder, path)?;
            }
            DocumentFormat::RdfXml => {
                let parser = match RdfXmlParser::new().with_base_iri(&base) {
                    Ok(parser) => parser,
                    Err(e) => {
                        warn!(base = %base, error = %e, "Ignoring invalid base IRI");
                        RdfXmlParser::new()
                    }
                };
                collect(parser.for_reader(reader), &mut builder, path)?;
            }
        }

        Ok(builder.build())
    }
}

impl OntologySource for RdfOntologySource {
    type Model = RdfOntology;

    fn load(&self, path: &Path) -> Result<RdfOntology, OntologyError> {
        if !path.exists() {
            return Err(OntologyError::NotFound(path.to_path_buf()));
        }

        let format = DocumentFormat::from_path(path)?;
        let file = File::open(path).map_err(|source| OntologyError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), format = format.as_str(), "Parsing ontology document");
        let ontology = self.parse(BufReader::new(file), format, path)?;

        info!(
            path = %path.display(),
            classes = ontology.class_count(),
            "Ontology loaded"
        );
        Ok(ontology)
    }
}

fn collect<I, E>(
    triples: I,
    builder: &mut OntologyBuilder,
    path: &Path,
) -> Result<(), OntologyError>
where
    I: Iterator<Item = Result<Triple, E>>,
    E: Display,
{
    for triple in triples {
        let triple = triple.map_err(|e| OntologyError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        builder.add(triple);
    }
    Ok(())
}

/// `file://` IRI for the document, used to resolve relative references
fn base_iri(path: &Path) -> String {
    let absolute: PathBuf = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf());
    let rendered = absolute.to_string_lossy().replace('\\', "/").replace(' ', "%20");

    if rendered.starts_with('/') {
        format!("file://{rendered}")
    } else {
        format!("file:///{rendered}")
    }
}
