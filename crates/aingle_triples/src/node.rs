//! Node identifiers for subjects, node-valued objects and graph names.
//!
//! A `NodeId` identifies a resource in the store. Named nodes carry an
//! IRI-like string, blank nodes an opaque number.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for a node in the graph.
///
/// # Examples
///
/// ```
/// use aingle_triples::NodeId;
///
/// let node = NodeId::named("user:alice");
/// assert!(node.is_named());
/// assert_eq!(node.as_name(), Some("user:alice"));
///
/// let blank = NodeId::blank_with_id(7);
/// assert!(blank.is_blank());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum NodeId {
    /// A named node, identified by a string, similar to a URI in RDF.
    Named(String),

    /// A blank (or anonymous) node, identified by a unique, auto-generated ID.
    Blank(u64),
}

impl NodeId {
    /// Creates a new `Named` node.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Creates a new, unique `Blank` node with an auto-incrementing ID.
    pub fn blank() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self::Blank(COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Creates a `Blank` node with a specific ID.
    pub fn blank_with_id(id: u64) -> Self {
        Self::Blank(id)
    }

    /// Returns `true` if this is a `Named` node.
    pub fn is_named(&self) -> bool {
        matches!(self, Self::Named(_))
    }

    /// Returns `true` if this is a `Blank` node.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank(_))
    }

    /// Returns the name if this is a `Named` node.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }

    /// For `Named` nodes, returns the namespace prefix (the part before the first colon).
    ///
    /// ```
    /// use aingle_triples::NodeId;
    ///
    /// assert_eq!(NodeId::named("user:alice").namespace(), Some("user"));
    /// assert_eq!(NodeId::blank_with_id(1).namespace(), None);
    /// ```
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Named(name) => name.split(':').next(),
            _ => None,
        }
    }

    /// For `Named` nodes, returns the local name (the part after the last colon).
    pub fn local_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => name.rsplit(':').next(),
            _ => None,
        }
    }

    /// Canonical, unambiguous byte encoding used for content addressing.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Named(name) => {
                let mut bytes = Vec::with_capacity(name.len() + 9);
                bytes.push(b'N');
                bytes.extend_from_slice(&(name.len() as u64).to_be_bytes());
                bytes.extend_from_slice(name.as_bytes());
                bytes
            }
            Self::Blank(id) => {
                let mut bytes = Vec::with_capacity(9);
                bytes.push(b'B');
                bytes.extend_from_slice(&id.to_be_bytes());
                bytes
            }
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "<{}>", name),
            Self::Blank(id) => write!(f, "_:b{}", id),
        }
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self::Named(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::Named(s.to_string())
    }
}
