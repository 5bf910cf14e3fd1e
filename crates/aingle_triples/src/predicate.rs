//! Predicates for semantic relationships.
//!
//! A `Predicate` represents the relationship between a subject and an object in a triple.
//! It is typically a URI-like string, often with a namespace prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::NodeId;

/// Represents the relationship (the "verb") in a `(subject, predicate, object, context)` quad.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Predicate {
    /// The predicate's unique identifier, typically a URI-like string.
    uri: String,
}

impl Predicate {
    /// Creates a new predicate from a string name.
    ///
    /// # Examples
    ///
    /// ```
    /// # use aingle_triples::Predicate;
    /// let p = Predicate::named("knows");
    /// assert_eq!(p.as_str(), "knows");
    /// ```
    pub fn named(name: impl Into<String>) -> Self {
        Self { uri: name.into() }
    }

    /// Returns the full URI of the predicate as a string slice.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Returns the namespace prefix of the predicate (the part before the last colon).
    pub fn namespace(&self) -> Option<&str> {
        self.uri.rsplit_once(':').map(|(ns, _)| ns)
    }

    /// Returns the local name of the predicate (the part after the last colon).
    pub fn local_name(&self) -> &str {
        self.uri.rsplit(':').next().unwrap_or(&self.uri)
    }

    /// The predicate viewed as a named node, which is how rule variables carry it.
    pub fn to_node(&self) -> NodeId {
        NodeId::named(self.uri.clone())
    }

    /// Canonical byte encoding used for content addressing.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.uri.len() + 9);
        bytes.push(b'P');
        bytes.extend_from_slice(&(self.uri.len() as u64).to_be_bytes());
        bytes.extend_from_slice(self.uri.as_bytes());
        bytes
    }

    // ========== Well-known RDF predicates ==========

    /// `rdf:type` - Indicates that a subject is an instance of a class.
    pub fn rdf_type() -> Self {
        Self::named("rdf:type")
    }

    /// `rdfs:subClassOf` - Indicates that a class is a subclass of another class.
    pub fn rdfs_subclass_of() -> Self {
        Self::named("rdfs:subClassOf")
    }

    /// `rdfs:subPropertyOf` - Indicates that a property is a sub-property of another.
    pub fn rdfs_subproperty_of() -> Self {
        Self::named("rdfs:subPropertyOf")
    }

    /// `rdfs:domain` - Declares the class of every subject of a property.
    pub fn rdfs_domain() -> Self {
        Self::named("rdfs:domain")
    }

    /// `rdfs:range` - Declares the class of every object of a property.
    pub fn rdfs_range() -> Self {
        Self::named("rdfs:range")
    }

    /// `owl:sameAs` - Indicates that two resources are identical.
    pub fn owl_same_as() -> Self {
        Self::named("owl:sameAs")
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.uri)
    }
}

impl From<&str> for Predicate {
    fn from(s: &str) -> Self {
        Self::named(s)
    }
}

impl From<String> for Predicate {
    fn from(s: String) -> Self {
        Self::named(s)
    }
}
