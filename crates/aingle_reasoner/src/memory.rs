//! In-memory store connection
//!
//! Provides a non-durable store for tests and embedded use. A transaction
//! sees base triples and derived state as of `begin`; host commits made
//! while it is open stay invisible to it. Derived state is shared with the
//! committed copy until the transaction first writes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use aingle_triples::{Triple, TripleIndex, TriplePattern};
use indexmap::IndexMap;
use log::debug;
use parking_lot::RwLock;

use crate::connection::{StoreConnection, StoreTransaction};
use crate::error::{Error, Result};
use crate::justification::{Justification, JustificationGraph, JustificationId};
use crate::program::Program;

/// The effective base changes of one host commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Triples that became present.
    pub added: Vec<Triple>,
    /// Triples that stopped being present.
    pub removed: Vec<Triple>,
}

impl ChangeSet {
    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// A program as persisted: its version and JSON document.
#[derive(Debug, Clone)]
struct StoredProgram {
    version: u64,
    json: String,
}

/// Everything a reasoner transaction may write.
#[derive(Debug, Clone, Default)]
struct DerivedState {
    generation: u64,
    inferred: TripleIndex,
    justifications: JustificationGraph,
    programs: IndexMap<String, StoredProgram>,
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    base: RwLock<Arc<TripleIndex>>,
    derived: RwLock<Arc<DerivedState>>,
    fail_queries: AtomicBool,
    fail_commits: AtomicBool,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a host commit of base triples: removals first, then additions.
    ///
    /// A triple both removed and re-added is reported in neither list.
    pub fn commit_base(&self, added: Vec<Triple>, removed: Vec<Triple>) -> ChangeSet {
        let mut guard = self.base.write();
        let base = Arc::make_mut(&mut *guard);
        let mut changes = ChangeSet::default();
        for triple in removed {
            if base.remove(&triple) {
                changes.removed.push(triple);
            }
        }
        for triple in added {
            if base.insert(triple.clone()) {
                if let Some(pos) = changes.removed.iter().position(|t| *t == triple) {
                    changes.removed.swap_remove(pos);
                } else {
                    changes.added.push(triple);
                }
            }
        }
        debug!(
            "base commit: +{} -{}",
            changes.added.len(),
            changes.removed.len()
        );
        changes
    }

    /// Adds base triples, returning those that were new.
    pub fn insert_base(&self, triples: impl IntoIterator<Item = Triple>) -> Vec<Triple> {
        self.commit_base(triples.into_iter().collect(), Vec::new())
            .added
    }

    /// Snapshot of all base triples.
    pub fn base_triples(&self) -> Vec<Triple> {
        self.base.read().iter().cloned().collect()
    }

    /// Snapshot of all committed inferred triples.
    pub fn inferred_triples(&self) -> Vec<Triple> {
        self.derived.read().inferred.iter().cloned().collect()
    }

    /// Returns `true` if `triple` is committed as base or inferred.
    pub fn contains(&self, triple: &Triple) -> bool {
        self.base.read().contains(triple) || self.derived.read().inferred.contains(triple)
    }

    /// Returns `true` if `triple` is a committed base triple.
    pub fn is_base(&self, triple: &Triple) -> bool {
        self.base.read().contains(triple)
    }

    /// Snapshot of all committed justifications.
    pub fn justifications(&self) -> Vec<Justification> {
        self.derived.read().justifications.iter().cloned().collect()
    }

    /// Committed justifications concluding `triple`.
    pub fn justifications_for(&self, triple: &Triple) -> Vec<Justification> {
        self.derived
            .read()
            .justifications
            .for_triple(triple)
            .into_iter()
            .cloned()
            .collect()
    }

    /// The committed version of a program.
    pub fn program(&self, name: &str) -> Result<Option<Program>> {
        self.derived
            .read()
            .programs
            .get(name)
            .map(|stored| Program::from_json(&stored.json))
            .transpose()
    }

    /// Checks committed state: every justification refers to present triples
    /// and every inferred triple has a justification.
    pub fn check_consistency(&self) -> Result<()> {
        let base = self.base.read();
        let derived = self.derived.read();
        derived
            .justifications
            .check(|t| base.contains(t) || derived.inferred.contains(t))?;
        for triple in derived.inferred.iter() {
            if !derived.justifications.is_justified(triple) {
                return Err(Error::Consistency(format!(
                    "inferred triple {} has no justification",
                    triple
                )));
            }
        }
        Ok(())
    }

    /// Makes every read through a transaction fail with a store error.
    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Makes every commit fail with a store error.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

impl StoreConnection for MemoryStore {
    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>> {
        let base = self.base.read().clone();
        let state = self.derived.read().clone();
        Ok(Box::new(MemoryTransaction {
            store: self,
            base,
            state,
        }))
    }
}

/// A transaction over a [`MemoryStore`].
pub struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    base: Arc<TripleIndex>,
    state: Arc<DerivedState>,
}

impl MemoryTransaction<'_> {
    fn check_reads(&self) -> Result<()> {
        if self.store.fail_queries.load(Ordering::SeqCst) {
            return Err(Error::Store("query failed".to_string()));
        }
        Ok(())
    }

    /// Private copy of the derived state, made on first write.
    fn state_mut(&mut self) -> &mut DerivedState {
        Arc::make_mut(&mut self.state)
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn has_triple(&self, pattern: &TriplePattern) -> Result<bool> {
        self.check_reads()?;
        Ok(self.base.has_match(pattern) || self.state.inferred.has_match(pattern))
    }

    fn query(&self, pattern: &TriplePattern) -> Result<Vec<Triple>> {
        self.check_reads()?;
        let mut results = self.base.query(pattern);
        results.extend(
            self.state
                .inferred
                .query(pattern)
                .into_iter()
                .filter(|t| !self.base.contains(t)),
        );
        Ok(results)
    }

    fn contains(&self, triple: &Triple) -> Result<bool> {
        self.check_reads()?;
        Ok(self.base.contains(triple) || self.state.inferred.contains(triple))
    }

    fn is_inferred(&self, triple: &Triple) -> Result<bool> {
        self.check_reads()?;
        Ok(self.state.inferred.contains(triple) && !self.base.contains(triple))
    }

    fn add_inferred(&mut self, triple: &Triple) -> Result<bool> {
        Ok(self.state_mut().inferred.insert(triple.clone()))
    }

    fn remove_inferred(&mut self, triple: &Triple) -> Result<bool> {
        Ok(self.state_mut().inferred.remove(triple))
    }

    fn store_justification(&mut self, justification: Justification) -> Result<JustificationId> {
        if let Some(existing) = self
            .state
            .justifications
            .for_triple(&justification.triple)
            .into_iter()
            .find(|j| j.same_derivation(&justification))
            .and_then(|j| j.id)
        {
            return Ok(existing);
        }
        self.state_mut()
            .justifications
            .insert(justification)
            .ok_or_else(|| Error::Consistency("justification was not stored".to_string()))
    }

    fn remove_justification(&mut self, id: JustificationId) -> Result<Option<Justification>> {
        Ok(self.state_mut().justifications.remove(id))
    }

    fn has_derivation(&self, justification: &Justification) -> Result<bool> {
        self.check_reads()?;
        Ok(self.state.justifications.contains_derivation(justification))
    }

    fn list_justifications_for_triple(&self, triple: &Triple) -> Result<Vec<Justification>> {
        self.check_reads()?;
        Ok(self
            .state
            .justifications
            .for_triple(triple)
            .into_iter()
            .cloned()
            .collect())
    }

    fn list_justifications_supported_by(&self, triple: &Triple) -> Result<Vec<Justification>> {
        self.check_reads()?;
        Ok(self
            .state
            .justifications
            .supported_by(triple)
            .into_iter()
            .cloned()
            .collect())
    }

    fn list_justifications_by_rule(&self, rule: &str) -> Result<Vec<Justification>> {
        self.check_reads()?;
        Ok(self
            .state
            .justifications
            .by_rule(rule)
            .into_iter()
            .cloned()
            .collect())
    }

    fn list_justifications(&self) -> Result<Vec<Justification>> {
        self.check_reads()?;
        Ok(self.state.justifications.iter().cloned().collect())
    }

    fn list_inferred(&self) -> Result<Vec<Triple>> {
        self.check_reads()?;
        Ok(self.state.inferred.iter().cloned().collect())
    }

    fn load_program(&self, name: &str) -> Result<Option<Program>> {
        self.check_reads()?;
        self.state
            .programs
            .get(name)
            .map(|stored| Program::from_json(&stored.json))
            .transpose()
    }

    fn store_program(&mut self, program: &Program) -> Result<()> {
        if self.state.programs.contains_key(&program.name) {
            return Err(Error::Store(format!(
                "program '{}' already exists",
                program.name
            )));
        }
        let json = program.to_json()?;
        self.state_mut().programs.insert(
            program.name.clone(),
            StoredProgram {
                version: program.version,
                json,
            },
        );
        Ok(())
    }

    fn update_program(&mut self, program: &Program) -> Result<()> {
        let json = program.to_json()?;
        let stored = self
            .state_mut()
            .programs
            .get_mut(&program.name)
            .ok_or_else(|| Error::Store(format!("program '{}' does not exist", program.name)))?;
        if program.version <= stored.version {
            return Err(Error::Store(format!(
                "stale update of program '{}': version {} is not newer than {}",
                program.name, program.version, stored.version
            )));
        }
        *stored = StoredProgram {
            version: program.version,
            json,
        };
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction {
            store, mut state, ..
        } = *self;
        if store.fail_commits.load(Ordering::SeqCst) {
            return Err(Error::Store("commit failed".to_string()));
        }
        let mut derived = store.derived.write();
        if Arc::ptr_eq(&state, &*derived) {
            return Ok(());
        }
        if derived.generation != state.generation {
            return Err(Error::Store(
                "concurrent commit of inferred state".to_string(),
            ));
        }
        Arc::make_mut(&mut state).generation += 1;
        debug!(
            "commit: {} inferred, {} justifications",
            state.inferred.len(),
            state.justifications.len()
        );
        *derived = state;
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        debug!("rollback");
        Ok(())
    }
}
