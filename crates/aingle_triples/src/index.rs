//! Dually-ordered triple index for pattern lookups.
//!
//! Implements two ordered indexes over a fixed-width four-part key:
//! - SPOC: all triples for a subject, subject+predicate, subject+predicate+object
//! - CSPO: all triples for a graph, graph+subject, graph+subject+predicate
//!
//! A pattern that is a bound prefix of either ordering becomes a range scan
//! between the smallest and largest keys sharing that prefix. Fully bound
//! patterns are point lookups. Everything else (object only, predicate only,
//! ...) falls back to a filtered linear scan.

use crate::{GraphName, NodeId, Predicate, Triple, TriplePattern, Value};
use indexmap::IndexMap;
use log::trace;
use std::collections::BTreeMap;

/// Types of indexes available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// Subject-Predicate-Object-Context index
    SPOC,
    /// Context-Subject-Predicate-Object index
    CSPO,
}

/// How a pattern is answered by [`TripleIndex::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessPath {
    /// Point lookup, every position bound.
    Exact,
    /// Range scan over a bound key prefix.
    Range(IndexType),
    /// Linear scan with a filter.
    Scan,
}

/// Which triples count as the same member of the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equivalence {
    /// All four positions must match.
    #[default]
    Quad,
    /// Subject, predicate and object must match; the graph is ignored.
    IgnoreContext,
}

impl Equivalence {
    /// The representative used for membership under this equivalence.
    pub fn project(&self, triple: &Triple) -> Triple {
        match self {
            Equivalence::Quad => triple.clone(),
            Equivalence::IgnoreContext => triple.without_context(),
        }
    }
}

/// One position of an index key. `Low` and `High` sort before and after every
/// real term and bound the unbound suffix of a range scan.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    Low,
    Node(NodeId),
    Predicate(Predicate),
    Value(Value),
    Graph(GraphName),
    High,
}

type Key = [KeyPart; 4];

fn spoc_key(triple: &Triple) -> Key {
    [
        KeyPart::Node(triple.subject.clone()),
        KeyPart::Predicate(triple.predicate.clone()),
        KeyPart::Value(triple.object.clone()),
        KeyPart::Graph(triple.context.clone()),
    ]
}

fn cspo_key(triple: &Triple) -> Key {
    [
        KeyPart::Graph(triple.context.clone()),
        KeyPart::Node(triple.subject.clone()),
        KeyPart::Predicate(triple.predicate.clone()),
        KeyPart::Value(triple.object.clone()),
    ]
}

/// Builds the smallest or largest key consistent with the bound positions.
fn bound_key(parts: [Option<KeyPart>; 4], fill: KeyPart) -> Key {
    parts.map(|part| part.unwrap_or_else(|| fill.clone()))
}

/// An in-memory working set of triples with SPOC and CSPO orderings.
///
/// # Examples
///
/// ```
/// use aingle_triples::{AccessPath, IndexType, NodeId, Predicate, Triple, TripleIndex, TriplePattern};
///
/// let mut index = TripleIndex::new();
/// index.insert(Triple::link(NodeId::named("a"), Predicate::named("t"), NodeId::named("b")));
/// index.insert(Triple::link(NodeId::named("b"), Predicate::named("t"), NodeId::named("c")));
///
/// let pattern = TriplePattern::subject(NodeId::named("a"));
/// assert_eq!(index.access_path(&pattern), AccessPath::Range(IndexType::SPOC));
/// assert_eq!(index.query(&pattern).len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TripleIndex {
    equivalence: Equivalence,
    /// Membership: equivalence representative -> stored triple.
    triples: IndexMap<Triple, Triple>,
    spoc: BTreeMap<Key, Triple>,
    cspo: BTreeMap<Key, Triple>,
}

impl TripleIndex {
    /// Create a new empty index with full quad equality.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty index using `equivalence` for membership.
    pub fn with_equivalence(equivalence: Equivalence) -> Self {
        Self {
            equivalence,
            ..Self::default()
        }
    }

    /// The membership equivalence of this index.
    pub fn equivalence(&self) -> Equivalence {
        self.equivalence
    }

    /// Insert a triple into the set and both orderings.
    ///
    /// Returns `false` if an equivalent triple is already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        let repr = self.equivalence.project(&triple);
        if self.triples.contains_key(&repr) {
            return false;
        }
        self.spoc.insert(spoc_key(&triple), triple.clone());
        self.cspo.insert(cspo_key(&triple), triple.clone());
        self.triples.insert(repr, triple);
        true
    }

    /// Remove the member equivalent to `triple` from the set and both orderings.
    ///
    /// Returns `false` if no equivalent triple was present.
    pub fn remove(&mut self, triple: &Triple) -> bool {
        let repr = self.equivalence.project(triple);
        match self.triples.swap_remove(&repr) {
            Some(stored) => {
                self.spoc.remove(&spoc_key(&stored));
                self.cspo.remove(&cspo_key(&stored));
                true
            }
            None => false,
        }
    }

    /// Returns `true` if an equivalent triple is present.
    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains_key(&self.equivalence.project(triple))
    }

    /// Picks the cheapest way to answer `pattern`.
    pub fn access_path(&self, pattern: &TriplePattern) -> AccessPath {
        match pattern.bound_mask() {
            [true, true, true, true] => AccessPath::Exact,
            [true, false, false, false] | [true, true, false, false] | [true, true, true, false] => {
                AccessPath::Range(IndexType::SPOC)
            }
            [false, false, false, true] | [true, false, false, true] | [true, true, false, true] => {
                AccessPath::Range(IndexType::CSPO)
            }
            _ => AccessPath::Scan,
        }
    }

    /// Find all triples matching `pattern`.
    pub fn query(&self, pattern: &TriplePattern) -> Vec<Triple> {
        let path = self.access_path(pattern);
        trace!("index query {:?} via {:?}", pattern.bound_mask(), path);

        match path {
            // Answered through membership so it agrees with `contains`; under
            // `IgnoreContext` this returns the stored member of the class.
            AccessPath::Exact => match pattern.to_triple() {
                Ok(triple) => self
                    .triples
                    .get(&self.equivalence.project(&triple))
                    .cloned()
                    .into_iter()
                    .collect(),
                Err(_) => Vec::new(),
            },
            AccessPath::Range(IndexType::SPOC) => {
                let prefix = [
                    pattern.subject.clone().map(KeyPart::Node),
                    pattern.predicate.clone().map(KeyPart::Predicate),
                    pattern.object.clone().map(KeyPart::Value),
                    None,
                ];
                let low = bound_key(prefix.clone(), KeyPart::Low);
                let high = bound_key(prefix, KeyPart::High);
                self.spoc.range(low..=high).map(|(_, t)| t.clone()).collect()
            }
            AccessPath::Range(IndexType::CSPO) => {
                let prefix = [
                    pattern.context.clone().map(KeyPart::Graph),
                    pattern.subject.clone().map(KeyPart::Node),
                    pattern.predicate.clone().map(KeyPart::Predicate),
                    None,
                ];
                let low = bound_key(prefix.clone(), KeyPart::Low);
                let high = bound_key(prefix, KeyPart::High);
                self.cspo.range(low..=high).map(|(_, t)| t.clone()).collect()
            }
            AccessPath::Scan => self
                .triples
                .values()
                .filter(|t| pattern.matches(t))
                .cloned()
                .collect(),
        }
    }

    /// Returns `true` if at least one triple matches `pattern`.
    pub fn has_match(&self, pattern: &TriplePattern) -> bool {
        match self.access_path(pattern) {
            AccessPath::Scan => self.triples.values().any(|t| pattern.matches(t)),
            _ => !self.query(pattern).is_empty(),
        }
    }

    /// Iterate over all stored triples.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.values()
    }

    /// Number of stored triples.
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Returns `true` if the index holds no triples.
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Get count of unique subjects
    pub fn subject_count(&self) -> usize {
        let mut count = 0;
        let mut last: Option<&KeyPart> = None;
        for key in self.spoc.keys() {
            if last != Some(&key[0]) {
                count += 1;
                last = Some(&key[0]);
            }
        }
        count
    }

    /// Get count of unique graphs
    pub fn context_count(&self) -> usize {
        let mut count = 0;
        let mut last: Option<&KeyPart> = None;
        for key in self.cspo.keys() {
            if last != Some(&key[0]) {
                count += 1;
                last = Some(&key[0]);
            }
        }
        count
    }

    /// Clear all indexes
    pub fn clear(&mut self) {
        self.triples.clear();
        self.spoc.clear();
        self.cspo.clear();
    }
}

impl Extend<Triple> for TripleIndex {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        for triple in iter {
            self.insert(triple);
        }
    }
}

impl FromIterator<Triple> for TripleIndex {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut index = TripleIndex::new();
        index.extend(iter);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(s: &str, p: &str, o: &str, g: Option<&str>) -> Triple {
        let t = Triple::link(NodeId::named(s), Predicate::named(p), NodeId::named(o));
        match g {
            Some(g) => t.in_graph(GraphName::named(g)),
            None => t,
        }
    }

    fn sample() -> TripleIndex {
        [
            quad("alice", "knows", "bob", None),
            quad("alice", "knows", "carol", Some("g1")),
            quad("alice", "likes", "bob", Some("g1")),
            quad("bob", "knows", "carol", None),
            quad("carol", "likes", "alice", Some("g2")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut index = TripleIndex::new();
        assert!(index.insert(quad("a", "p", "b", None)));
        assert!(!index.insert(quad("a", "p", "b", None)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_exact_lookup() {
        let index = sample();
        let pattern = TriplePattern::exact(&quad("alice", "knows", "carol", Some("g1")));
        assert_eq!(index.access_path(&pattern), AccessPath::Exact);
        assert_eq!(index.query(&pattern).len(), 1);

        let missing = TriplePattern::exact(&quad("alice", "knows", "carol", None));
        assert!(index.query(&missing).is_empty());
    }

    #[test]
    fn test_subject_prefix_uses_spoc() {
        let index = sample();
        let pattern = TriplePattern::subject(NodeId::named("alice"));
        assert_eq!(index.access_path(&pattern), AccessPath::Range(IndexType::SPOC));
        assert_eq!(index.query(&pattern).len(), 3);

        let pattern = pattern.with_predicate(Predicate::named("knows"));
        assert_eq!(index.access_path(&pattern), AccessPath::Range(IndexType::SPOC));
        assert_eq!(index.query(&pattern).len(), 2);

        let pattern = pattern.with_object(Value::named("bob"));
        assert_eq!(index.query(&pattern), vec![quad("alice", "knows", "bob", None)]);
    }

    #[test]
    fn test_context_prefix_uses_cspo() {
        let index = sample();
        let pattern = TriplePattern::context(GraphName::named("g1"));
        assert_eq!(index.access_path(&pattern), AccessPath::Range(IndexType::CSPO));
        assert_eq!(index.query(&pattern).len(), 2);

        let pattern = pattern.with_subject(NodeId::named("alice"));
        assert_eq!(index.access_path(&pattern), AccessPath::Range(IndexType::CSPO));
        assert_eq!(index.query(&pattern).len(), 2);

        let pattern = pattern.with_predicate(Predicate::named("likes"));
        assert_eq!(index.query(&pattern), vec![quad("alice", "likes", "bob", Some("g1"))]);

        let default_graph = TriplePattern::context(GraphName::Default);
        assert_eq!(index.query(&default_graph).len(), 2);
    }

    #[test]
    fn test_non_prefix_patterns_scan() {
        let index = sample();
        let by_predicate = TriplePattern::predicate(Predicate::named("likes"));
        assert_eq!(index.access_path(&by_predicate), AccessPath::Scan);
        assert_eq!(index.query(&by_predicate).len(), 2);

        let by_object = TriplePattern::object(Value::named("carol"));
        assert_eq!(index.access_path(&by_object), AccessPath::Scan);
        assert_eq!(index.query(&by_object).len(), 2);

        let subject_object = TriplePattern::subject(NodeId::named("alice"))
            .with_object(Value::named("bob"));
        assert_eq!(index.access_path(&subject_object), AccessPath::Scan);
        assert_eq!(index.query(&subject_object).len(), 2);

        assert_eq!(index.query(&TriplePattern::any()).len(), 5);
    }

    #[test]
    fn test_remove_updates_both_orderings() {
        let mut index = sample();
        let t = quad("alice", "likes", "bob", Some("g1"));
        assert!(index.remove(&t));
        assert!(!index.remove(&t));
        assert!(!index.contains(&t));
        assert_eq!(index.query(&TriplePattern::subject(NodeId::named("alice"))).len(), 2);
        assert_eq!(index.query(&TriplePattern::context(GraphName::named("g1"))).len(), 1);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_ignore_context_equivalence() {
        let mut index = TripleIndex::with_equivalence(Equivalence::IgnoreContext);
        assert!(index.insert(quad("a", "p", "b", Some("g1"))));
        assert!(!index.insert(quad("a", "p", "b", Some("g2"))));
        assert!(index.contains(&quad("a", "p", "b", None)));

        // Removal by an equivalent triple removes the stored member from both orderings.
        let exact = TriplePattern::exact(&quad("a", "p", "b", Some("g2")));
        assert_eq!(index.query(&exact), vec![quad("a", "p", "b", Some("g1"))]);
        assert!(index.has_match(&exact));

        assert!(index.remove(&quad("a", "p", "b", None)));
        assert!(index.is_empty());
        assert!(index.query(&TriplePattern::context(GraphName::named("g1"))).is_empty());
    }

    #[test]
    fn test_literal_objects_in_ranges() {
        let mut index = TripleIndex::new();
        index.insert(Triple::new(
            NodeId::named("alice"),
            Predicate::named("age"),
            Value::integer(30),
        ));
        index.insert(Triple::new(
            NodeId::named("alice"),
            Predicate::named("name"),
            Value::literal("Alice"),
        ));
        let pattern = TriplePattern::subject(NodeId::named("alice"))
            .with_predicate(Predicate::named("age"))
            .with_object(Value::integer(30));
        assert_eq!(index.query(&pattern).len(), 1);
    }

    #[test]
    fn test_counts() {
        let index = sample();
        assert_eq!(index.subject_count(), 3);
        assert_eq!(index.context_count(), 3);
        assert!(index.has_match(&TriplePattern::predicate(Predicate::named("knows"))));
        assert!(!index.has_match(&TriplePattern::predicate(Predicate::named("hates"))));
    }
}
