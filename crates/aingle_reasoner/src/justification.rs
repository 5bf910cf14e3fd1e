//! Justifications and the dependency graph between them and triples.
//!
//! The graph is bipartite: justifications on one side, triples on the other.
//! Edges are kept as id sets keyed by [`TripleId`] in both directions, so a
//! justification never holds a reference to another graph node.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use aingle_triples::{Triple, TripleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier assigned to a justification when it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JustificationId(pub u64);

impl fmt::Display for JustificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "j{}", self.0)
    }
}

/// A record that `triple` follows from `supporting_triples` by `supporting_rules`.
///
/// Valid iff every supporting triple exists and at least one rule is named.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Justification {
    /// Assigned by the store; `None` until stored.
    pub id: Option<JustificationId>,
    /// The derived triple.
    pub triple: Triple,
    /// Triples matched by the rule body.
    pub supporting_triples: BTreeSet<Triple>,
    /// Rules that produced the derivation.
    pub supporting_rules: BTreeSet<String>,
    /// When the derivation was recorded.
    pub created_at: DateTime<Utc>,
}

impl Justification {
    /// A justification of `triple` by one rule.
    pub fn new(triple: Triple, supporting_triples: BTreeSet<Triple>, rule: impl Into<String>) -> Self {
        Self {
            id: None,
            triple,
            supporting_triples,
            supporting_rules: BTreeSet::from([rule.into()]),
            created_at: Utc::now(),
        }
    }

    /// Same conclusion, same premises, same rules. Ids and timestamps are ignored.
    pub fn same_derivation(&self, other: &Justification) -> bool {
        self.triple == other.triple
            && self.supporting_triples == other.supporting_triples
            && self.supporting_rules == other.supporting_rules
    }

    /// Returns `true` if the derivation cites its own conclusion.
    pub fn is_circular(&self) -> bool {
        self.supporting_triples.contains(&self.triple)
    }

    /// Returns `true` if the rule set is non-empty and every support satisfies `exists`.
    pub fn is_valid(&self, exists: impl Fn(&Triple) -> bool) -> bool {
        !self.supporting_rules.is_empty() && self.supporting_triples.iter().all(exists)
    }

    /// Returns `true` if `rule` is among the supporting rules.
    pub fn cites_rule(&self, rule: &str) -> bool {
        self.supporting_rules.contains(rule)
    }
}

/// Justification nodes with edges to the triples they justify and cite.
#[derive(Debug, Clone, Default)]
pub struct JustificationGraph {
    next_id: u64,
    nodes: BTreeMap<JustificationId, Justification>,
    /// Justified triple -> justifications concluding it.
    by_triple: HashMap<TripleId, BTreeSet<JustificationId>>,
    /// Supporting triple -> justifications citing it.
    by_support: HashMap<TripleId, BTreeSet<JustificationId>>,
    /// Rule name -> justifications it produced.
    by_rule: HashMap<String, BTreeSet<JustificationId>>,
}

impl JustificationGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a justification and assigns it an id.
    ///
    /// Returns `None` if an identical derivation is already present.
    pub fn insert(&mut self, mut justification: Justification) -> Option<JustificationId> {
        if self.contains_derivation(&justification) {
            return None;
        }

        self.next_id += 1;
        let id = JustificationId(self.next_id);
        justification.id = Some(id);

        self.by_triple
            .entry(justification.triple.id())
            .or_default()
            .insert(id);
        for support in &justification.supporting_triples {
            self.by_support.entry(support.id()).or_default().insert(id);
        }
        for rule in &justification.supporting_rules {
            self.by_rule.entry(rule.clone()).or_default().insert(id);
        }
        self.nodes.insert(id, justification);
        Some(id)
    }

    /// Removes a justification and all of its edges.
    pub fn remove(&mut self, id: JustificationId) -> Option<Justification> {
        let justification = self.nodes.remove(&id)?;

        unlink(&mut self.by_triple, &justification.triple.id(), id);
        for support in &justification.supporting_triples {
            unlink(&mut self.by_support, &support.id(), id);
        }
        for rule in &justification.supporting_rules {
            unlink(&mut self.by_rule, rule, id);
        }
        Some(justification)
    }

    /// Looks up a justification by id.
    pub fn get(&self, id: JustificationId) -> Option<&Justification> {
        self.nodes.get(&id)
    }

    /// Justifications concluding `triple`.
    pub fn for_triple(&self, triple: &Triple) -> Vec<&Justification> {
        self.resolve(self.by_triple.get(&triple.id()))
    }

    /// Justifications citing `triple` as a premise.
    pub fn supported_by(&self, triple: &Triple) -> Vec<&Justification> {
        self.resolve(self.by_support.get(&triple.id()))
    }

    /// Justifications produced by `rule`.
    pub fn by_rule(&self, rule: &str) -> Vec<&Justification> {
        self.resolve(self.by_rule.get(rule))
    }

    /// Returns `true` if `triple` has at least one justification.
    pub fn is_justified(&self, triple: &Triple) -> bool {
        self.by_triple
            .get(&triple.id())
            .is_some_and(|ids| !ids.is_empty())
    }

    /// Returns `true` if an identical derivation is stored.
    pub fn contains_derivation(&self, justification: &Justification) -> bool {
        self.for_triple(&justification.triple)
            .iter()
            .any(|j| j.same_derivation(justification))
    }

    /// Number of justifications
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate in id order
    pub fn iter(&self) -> impl Iterator<Item = &Justification> {
        self.nodes.values()
    }

    /// Remove everything. Ids are not reused.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.by_triple.clear();
        self.by_support.clear();
        self.by_rule.clear();
    }

    /// Verifies that every justified triple and every premise satisfies `exists`.
    pub fn check(&self, exists: impl Fn(&Triple) -> bool) -> Result<()> {
        for (id, justification) in &self.nodes {
            if !exists(&justification.triple) {
                return Err(Error::Consistency(format!(
                    "justification {} concludes missing triple {}",
                    id, justification.triple
                )));
            }
            if let Some(missing) = justification
                .supporting_triples
                .iter()
                .find(|t| !exists(t))
            {
                return Err(Error::Consistency(format!(
                    "justification {} of {} cites missing triple {}",
                    id, justification.triple, missing
                )));
            }
        }
        Ok(())
    }

    fn resolve(&self, ids: Option<&BTreeSet<JustificationId>>) -> Vec<&Justification> {
        ids.into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }
}

fn unlink<K, Q>(edges: &mut HashMap<K, BTreeSet<JustificationId>>, key: &Q, id: JustificationId)
where
    K: std::borrow::Borrow<Q> + std::hash::Hash + Eq,
    Q: std::hash::Hash + Eq + ?Sized,
{
    if let Some(ids) = edges.get_mut(key) {
        ids.remove(&id);
        if ids.is_empty() {
            edges.remove(key);
        }
    }
}
