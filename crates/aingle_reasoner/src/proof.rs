//! Proof extraction from stored justifications.
//!
//! A proof explains a triple by walking its justifications back to base
//! facts. Steps are ordered so every premise appears before the step that
//! uses it; the last step is the conclusion.

use std::collections::{HashMap, HashSet};

use aingle_triples::Triple;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::connection::{StoreConnection, StoreTransaction};
use crate::error::{Error, Result};

/// How a proof step establishes its triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    /// The triple is a base fact.
    Fact,
    /// The triple was derived by a rule from the step's premises.
    Inference {
        /// The rule applied.
        rule: String,
    },
}

/// One step of a proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// The triple established by this step.
    pub triple: Triple,
    /// Fact or inference.
    pub kind: StepKind,
    /// Triples this step relies on; empty for facts.
    pub premises: Vec<Triple>,
    /// 0 for facts, otherwise one more than the deepest premise.
    pub depth: usize,
}

impl ProofStep {
    /// The rule applied, if this step is an inference.
    pub fn rule(&self) -> Option<&str> {
        match &self.kind {
            StepKind::Inference { rule } => Some(rule),
            StepKind::Fact => None,
        }
    }
}

/// A derivation of one triple from base facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proof {
    /// The explained triple.
    pub conclusion: Triple,
    /// Steps in dependency order.
    pub steps: Vec<ProofStep>,
    /// When the proof was generated.
    pub generated_at: DateTime<Utc>,
}

impl Proof {
    /// Builds a proof of `triple` from the justifications committed in `store`.
    ///
    /// Returns `Ok(None)` if the triple is not present. Justifications that
    /// would lead back to a triple already on the current path are skipped.
    pub fn explain(store: &dyn StoreConnection, triple: &Triple) -> Result<Option<Proof>> {
        let tx = store.begin()?;
        let result = Self::explain_in(tx.as_ref(), triple);
        tx.rollback()?;
        result
    }

    /// As [`explain`](Proof::explain), inside an open transaction.
    pub fn explain_in(tx: &dyn StoreTransaction, triple: &Triple) -> Result<Option<Proof>> {
        if !tx.contains(triple)? {
            return Ok(None);
        }

        let mut builder = ProofBuilder {
            tx,
            steps: Vec::new(),
            depths: HashMap::new(),
            path: HashSet::new(),
        };
        if !builder.prove(triple)? {
            return Err(Error::Consistency(format!(
                "{} is present but has no well-founded justification",
                triple
            )));
        }

        Ok(Some(Proof {
            conclusion: triple.clone(),
            steps: builder.steps,
            generated_at: Utc::now(),
        }))
    }

    /// Returns the maximum depth of the proof tree.
    pub fn depth(&self) -> usize {
        self.steps.iter().map(|s| s.depth).max().unwrap_or(0)
    }

    /// Returns the number of steps in the proof.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the proof contains no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Base facts the proof rests on.
    pub fn facts(&self) -> Vec<&Triple> {
        self.steps
            .iter()
            .filter(|s| s.kind == StepKind::Fact)
            .map(|s| &s.triple)
            .collect()
    }

    /// Distinct rules applied, in first-use order.
    pub fn rules_used(&self) -> Vec<&str> {
        let mut rules = Vec::new();
        for rule in self.steps.iter().filter_map(|s| s.rule()) {
            if !rules.contains(&rule) {
                rules.push(rule);
            }
        }
        rules
    }

    /// Serializes the proof.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes a proof.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

struct ProofBuilder<'t> {
    tx: &'t dyn StoreTransaction,
    steps: Vec<ProofStep>,
    /// Triples already proven, with their depth.
    depths: HashMap<Triple, usize>,
    /// Triples on the current derivation path.
    path: HashSet<Triple>,
}

impl ProofBuilder<'_> {
    fn prove(&mut self, triple: &Triple) -> Result<bool> {
        if self.depths.contains_key(triple) {
            return Ok(true);
        }
        if !self.tx.contains(triple)? {
            return Ok(false);
        }
        if !self.tx.is_inferred(triple)? {
            self.record(triple, StepKind::Fact, Vec::new(), 0);
            return Ok(true);
        }
        if !self.path.insert(triple.clone()) {
            return Ok(false);
        }

        let mut proven = false;
        for justification in self.tx.list_justifications_for_triple(triple)? {
            let Some(rule) = justification.supporting_rules.iter().next().cloned() else {
                continue;
            };
            let mut all = true;
            for premise in &justification.supporting_triples {
                if !self.prove(premise)? {
                    all = false;
                    break;
                }
            }
            if all {
                let depth = 1 + justification
                    .supporting_triples
                    .iter()
                    .filter_map(|p| self.depths.get(p))
                    .max()
                    .copied()
                    .unwrap_or(0);
                let premises = justification.supporting_triples.into_iter().collect();
                self.record(triple, StepKind::Inference { rule }, premises, depth);
                proven = true;
                break;
            }
        }

        self.path.remove(triple);
        Ok(proven)
    }

    fn record(&mut self, triple: &Triple, kind: StepKind, premises: Vec<Triple>, depth: usize) {
        self.depths.insert(triple.clone(), depth);
        self.steps.push(ProofStep {
            triple: triple.clone(),
            kind,
            premises,
            depth,
        });
    }
}
