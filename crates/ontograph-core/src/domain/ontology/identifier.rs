//! Canonical identifiers for ontology classes
//!
//! A class reference in its external textual form (for example
//! `<http://ex.org/onto#Animal>`) is reduced to the name used as the
//! deduplication key of its graph node.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the synthetic root every top-level class is anchored to
pub const ROOT_IDENTIFIER: &str = "owl:Thing";

/// Canonical name of a class in the graph
///
/// Two references that normalize to the same string denote the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassIdentifier(String);

impl ClassIdentifier {
    /// Wrap an already-canonical name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The root identifier (`owl:Thing`)
    pub fn root() -> Self {
        Self(ROOT_IDENTIFIER.to_string())
    }

    /// Whether this is the root identifier
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_IDENTIFIER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClassIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a class reference to its canonical identifier
///
/// With a `#` present, the result is the fragment between the last `#` and
/// the final `>` (or the end of the reference when no `>` follows it).
/// Without a `#`, the reference is returned unchanged.
pub fn normalize(reference: &str) -> ClassIdentifier {
    let Some(hash) = reference.rfind('#') else {
        return ClassIdentifier::new(reference);
    };

    let fragment = &reference[hash + 1..];
    let fragment = match fragment.rfind('>') {
        Some(close) => &fragment[..close],
        None => fragment,
    };

    ClassIdentifier::new(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_fragment() {
        assert_eq!(normalize("http://ex.org/onto#Animal").as_str(), "Animal");
        assert_eq!(normalize("<http://ex.org/onto#Animal>").as_str(), "Animal");
    }

    #[test]
    fn test_normalize_without_fragment() {
        assert_eq!(normalize("PlainName").as_str(), "PlainName");
        assert_eq!(
            normalize("<http://ex.org/onto/Animal>").as_str(),
            "<http://ex.org/onto/Animal>"
        );
    }

    #[test]
    fn test_normalize_uses_last_hash() {
        assert_eq!(normalize("<http://ex.org/a#b#Cat>").as_str(), "Cat");
    }

    #[test]
    fn test_normalize_root_is_unchanged() {
        let id = normalize(ROOT_IDENTIFIER);
        assert!(id.is_root());
        assert_eq!(id, ClassIdentifier::root());
    }

    #[test]
    fn test_normalize_edge_cases() {
        assert_eq!(normalize("").as_str(), "");
        assert_eq!(normalize("<http://ex.org/onto#>").as_str(), "");
        assert_eq!(normalize("#").as_str(), "");
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let reference = "<http://example.org/zoo#Mammal>";
        assert_eq!(normalize(reference), normalize(reference));
    }
}
