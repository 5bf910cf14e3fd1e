//! Quads: a subject, predicate and object scoped to a graph.
//!
//! The store calls these "triples" even though each one carries a context.
//! Equality, ordering and hashing are structural over all four positions.

use crate::{NodeId, Predicate, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The context (named graph) a triple lives in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GraphName {
    /// The unnamed default graph.
    #[default]
    Default,
    /// A named graph.
    Named(NodeId),
}

impl GraphName {
    /// Creates a graph name from a node name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(NodeId::named(name))
    }

    /// Returns `true` for the default graph.
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// Returns the node naming this graph, if any.
    pub fn as_node(&self) -> Option<&NodeId> {
        match self {
            Self::Named(node) => Some(node),
            Self::Default => None,
        }
    }

    /// Canonical byte encoding used for content addressing.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Default => vec![b'D'],
            Self::Named(node) => {
                let mut bytes = vec![b'G'];
                bytes.extend(node.to_bytes());
                bytes
            }
        }
    }
}

impl fmt::Display for GraphName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Named(node) => write!(f, "{}", node),
        }
    }
}

impl From<NodeId> for GraphName {
    fn from(node: NodeId) -> Self {
        Self::Named(node)
    }
}

/// An immutable `(subject, predicate, object, context)` fact.
///
/// # Examples
///
/// ```
/// use aingle_triples::{GraphName, NodeId, Predicate, Triple, Value};
///
/// let t = Triple::new(
///     NodeId::named("a"),
///     Predicate::named("t"),
///     Value::named("b"),
/// );
/// assert!(t.context.is_default());
///
/// let scoped = t.clone().in_graph(GraphName::named("g1"));
/// assert_ne!(t, scoped);
/// assert_eq!(t.id(), t.clone().id());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    /// The subject node.
    pub subject: NodeId,
    /// The relationship.
    pub predicate: Predicate,
    /// The object, a node or a literal.
    pub object: Value,
    /// The graph this triple belongs to.
    pub context: GraphName,
}

impl Triple {
    /// Creates a triple in the default graph.
    pub fn new(subject: NodeId, predicate: Predicate, object: Value) -> Self {
        Self {
            subject,
            predicate,
            object,
            context: GraphName::Default,
        }
    }

    /// Creates a node-to-node link in the default graph.
    pub fn link(subject: NodeId, predicate: Predicate, object: NodeId) -> Self {
        Self::new(subject, predicate, Value::Node(object))
    }

    /// Returns this triple moved into `context`.
    pub fn in_graph(mut self, context: GraphName) -> Self {
        self.context = context;
        self
    }

    /// The same triple in the default graph.
    pub fn without_context(&self) -> Self {
        Self {
            context: GraphName::Default,
            ..self.clone()
        }
    }

    /// The content address of this triple.
    pub fn id(&self) -> TripleId {
        TripleId::of(self)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_default() {
            write!(f, "({} {} {})", self.subject, self.predicate, self.object)
        } else {
            write!(
                f,
                "({} {} {} {})",
                self.subject, self.predicate, self.object, self.context
            )
        }
    }
}

/// A content-addressed triple key: the BLAKE3 digest of all four positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TripleId([u8; 32]);

impl TripleId {
    /// Computes the identifier of a triple.
    pub fn of(triple: &Triple) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&triple.subject.to_bytes());
        hasher.update(&triple.predicate.to_bytes());
        hasher.update(&triple.object.to_bytes());
        hasher.update(&triple.context.to_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Wraps raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full hex rendering of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TripleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str, p: &str, o: &str) -> Triple {
        Triple::link(NodeId::named(s), Predicate::named(p), NodeId::named(o))
    }

    #[test]
    fn test_structural_equality_includes_context() {
        let a = t("a", "t", "b");
        let b = t("a", "t", "b").in_graph(GraphName::named("g"));
        assert_ne!(a, b);
        assert_eq!(a, b.without_context());
    }

    #[test]
    fn test_id_is_content_addressed() {
        assert_eq!(t("a", "t", "b").id(), t("a", "t", "b").id());
        assert_ne!(t("a", "t", "b").id(), t("b", "t", "a").id());
        assert_ne!(
            t("a", "t", "b").id(),
            t("a", "t", "b").in_graph(GraphName::named("g")).id()
        );
    }

    #[test]
    fn test_id_distinguishes_literal_from_node() {
        let node = t("a", "p", "b");
        let literal = Triple::new(NodeId::named("a"), Predicate::named("p"), Value::literal("b"));
        assert_ne!(node.id(), literal.id());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", t("a", "t", "b")), "(<a> <t> <b>)");
        let scoped = t("a", "t", "b").in_graph(GraphName::named("g"));
        assert_eq!(format!("{}", scoped), "(<a> <t> <b> <g>)");
        assert_eq!(t("a", "t", "b").id().to_hex().len(), 64);
    }
}
