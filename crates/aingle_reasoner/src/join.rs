//! Body evaluation by left-deep nested-loop join.
//!
//! One body pattern is unified with the triple that triggered evaluation; the
//! others are resolved in order against a [`Lookup`], each step substituting
//! the variables bound so far.

use std::collections::BTreeSet;

use aingle_triples::{Triple, TripleIndex, TriplePattern as GraphPattern};
use log::trace;

use crate::error::Result;
use crate::rule::{Bindings, Rule};

/// A source of triples for pattern lookups during a join.
pub trait Lookup {
    /// All triples matching `pattern`.
    fn lookup(&self, pattern: &GraphPattern) -> Result<Vec<Triple>>;
}

impl Lookup for TripleIndex {
    fn lookup(&self, pattern: &GraphPattern) -> Result<Vec<Triple>> {
        Ok(self.query(pattern))
    }
}

/// One complete match of a rule body.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BodyMatch {
    /// Bindings for every body variable.
    pub bindings: Bindings,
    /// The triples the body patterns matched.
    pub support: BTreeSet<Triple>,
}

/// Finds every way the body of `rule` matches with pattern `seed_index` bound to `seed`.
///
/// The result is complete with respect to `lookup` and free of duplicates.
pub fn join_body(
    rule: &Rule,
    seed_index: usize,
    seed: &Triple,
    lookup: &dyn Lookup,
) -> Result<Vec<BodyMatch>> {
    let seed_bindings = match rule.body.get(seed_index).and_then(|p| p.bind(seed)) {
        Some(bindings) => bindings,
        None => return Ok(Vec::new()),
    };

    let mut partial = vec![BodyMatch {
        bindings: seed_bindings,
        support: BTreeSet::from([seed.clone()]),
    }];

    for (i, pattern) in rule.body.iter().enumerate() {
        if i == seed_index {
            continue;
        }

        let mut next = Vec::new();
        for current in &partial {
            let Some(query) = pattern.resolve(&current.bindings) else {
                continue;
            };
            for candidate in lookup.lookup(&query)? {
                let mut bindings = current.bindings.clone();
                if pattern.matches_with(&candidate, &mut bindings) {
                    let mut support = current.support.clone();
                    support.insert(candidate);
                    next.push(BodyMatch { bindings, support });
                }
            }
        }
        trace!(
            "join {} step {}: {} -> {} partial matches",
            rule.name,
            i,
            partial.len(),
            next.len()
        );

        if next.is_empty() {
            return Ok(Vec::new());
        }
        partial = next;
    }

    let unique: BTreeSet<BodyMatch> = partial.into_iter().collect();
    Ok(unique.into_iter().collect())
}
