//! Defines the `Value` type for the object of a quad.
//!
//! A `Value` is either a reference to another node in the graph or a literal.
//! Every variant is totally ordered and hashable, so values can take part in
//! index keys and structural triple equality.

use crate::{NodeId, Predicate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the object of a `(subject, predicate, object, context)` quad.
///
/// # Examples
///
/// ```
/// use aingle_triples::{NodeId, Value};
///
/// let name = Value::literal("Alice");
/// assert!(name.is_literal());
/// assert_eq!(name.as_string(), Some("Alice"));
///
/// let friend = Value::node(NodeId::named("user:bob"));
/// assert_eq!(friend.as_node(), Some(&NodeId::named("user:bob")));
///
/// assert_eq!(Value::integer(30).as_integer(), Some(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    /// A reference to another node in the graph, linking two subjects together.
    Node(NodeId),

    /// A UTF-8 string literal.
    String(String),

    /// A 64-bit signed integer literal.
    Integer(i64),

    /// A boolean literal.
    Boolean(bool),

    /// A date-time literal, stored as an ISO 8601 string.
    DateTime(String),

    /// A literal with an explicit datatype URI, similar to RDF typed literals.
    Typed { value: String, datatype: String },

    /// A string literal with a language tag.
    LangString { value: String, lang: String },
}

impl Value {
    /// Creates a new string literal [`Value`].
    pub fn literal(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Creates a [`Value`] that is a reference to another [`NodeId`].
    pub fn node(node: NodeId) -> Self {
        Self::Node(node)
    }

    /// Shorthand for a reference to a named node.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Node(NodeId::named(name))
    }

    /// Creates an integer literal.
    pub fn integer(n: i64) -> Self {
        Self::Integer(n)
    }

    /// Creates a boolean literal.
    pub fn boolean(b: bool) -> Self {
        Self::Boolean(b)
    }

    /// Creates a date-time literal from an ISO 8601 string.
    pub fn datetime(dt: impl Into<String>) -> Self {
        Self::DateTime(dt.into())
    }

    /// Creates a typed literal.
    ///
    /// Decimal numbers are carried this way, e.g. `Value::typed("98.5", "xsd:decimal")`.
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Typed {
            value: value.into(),
            datatype: datatype.into(),
        }
    }

    /// Creates a language-tagged string literal.
    pub fn lang_string(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self::LangString {
            value: value.into(),
            lang: lang.into(),
        }
    }

    /// Returns `true` if the value is a node reference.
    pub fn is_node(&self) -> bool {
        matches!(self, Self::Node(_))
    }

    /// Returns `true` if the value is any kind of literal.
    pub fn is_literal(&self) -> bool {
        !self.is_node()
    }

    /// Returns the node if this value references one.
    pub fn as_node(&self) -> Option<&NodeId> {
        match self {
            Self::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the lexical form of string-like literals.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::LangString { value, .. } => Some(value),
            Self::Typed { value, .. } => Some(value),
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Returns the integer if this is an integer literal.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean if this is a boolean literal.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Interprets a named node value as a predicate.
    pub fn as_predicate(&self) -> Option<Predicate> {
        match self {
            Self::Node(NodeId::Named(name)) => Some(Predicate::named(name.clone())),
            _ => None,
        }
    }

    /// Canonical byte encoding used for content addressing.
    pub fn to_bytes(&self) -> Vec<u8> {
        fn text(tag: u8, parts: &[&str]) -> Vec<u8> {
            let mut bytes = vec![tag];
            for part in parts {
                bytes.extend_from_slice(&(part.len() as u64).to_be_bytes());
                bytes.extend_from_slice(part.as_bytes());
            }
            bytes
        }

        match self {
            Self::Node(node) => {
                let mut bytes = vec![b'n'];
                bytes.extend(node.to_bytes());
                bytes
            }
            Self::String(s) => text(b's', &[s]),
            Self::Integer(n) => {
                let mut bytes = vec![b'i'];
                bytes.extend_from_slice(&n.to_be_bytes());
                bytes
            }
            Self::Boolean(b) => vec![b'b', u8::from(*b)],
            Self::DateTime(dt) => text(b'd', &[dt]),
            Self::Typed { value, datatype } => text(b't', &[value, datatype]),
            Self::LangString { value, lang } => text(b'l', &[value, lang]),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "\"{}\"", s),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::DateTime(dt) => write!(f, "\"{}\"^^xsd:dateTime", dt),
            Self::Typed { value, datatype } => write!(f, "\"{}\"^^<{}>", value, datatype),
            Self::LangString { value, lang } => write!(f, "\"{}\"@{}", value, lang),
        }
    }
}

// Convenient conversions from standard types into `Value`.
impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(n as i64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<NodeId> for Value {
    fn from(n: NodeId) -> Self {
        Self::Node(n)
    }
}

impl From<Predicate> for Value {
    fn from(p: Predicate) -> Self {
        Self::Node(p.to_node())
    }
}
