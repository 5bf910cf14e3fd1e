//! Incremental forward chaining with justification-based truth maintenance.
//!
//! Every operation is one store transaction:
//!
//! ```text
//!   begin ──► [persist program] ──► addition fixpoint ──► removal cascade ──► commit
//!                                         │                       │
//!                                   working set              grounding pass
//!                                   + store lookups          over affected triples
//!            any error ──────────────────────────────────────────────────────► rollback
//! ```
//!
//! The addition phase is semi-naive: only triples new in this run are pushed
//! through the rules, and each one only through the body positions it can
//! bind. The removal phase deletes what is no longer well-founded, where a
//! derived triple is well-founded if some justification of it rests, through
//! other well-founded triples, on base facts. Derived triples that only
//! support each other are not well-founded.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use aingle_triples::{Equivalence, Triple, TripleIndex, TriplePattern as GraphPattern};
use log::{debug, error, info, trace, warn};
use serde::Serialize;

use crate::config::ReasonerConfig;
use crate::connection::{StoreConnection, StoreTransaction};
use crate::error::{Error, Result};
use crate::join::{join_body, Lookup};
use crate::justification::Justification;
use crate::program::Program;
use crate::proof::Proof;
use crate::rule::Rule;

/// What kind of run produced a [`RunReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RunKind {
    /// Incremental evaluation after a base commit.
    AfterCommit,
    /// Full re-evaluation.
    ReRun,
    /// A rule was added.
    AddRule,
    /// A rule was removed.
    RemoveRule,
    /// A program was loaded.
    LoadProgram,
}

/// Counters for one committed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// The operation.
    pub kind: RunKind,
    /// Inferred triples added.
    pub derived: usize,
    /// Inferred triples removed.
    pub retracted: usize,
    /// Justifications stored.
    pub justifications_added: usize,
    /// Justifications deleted.
    pub justifications_removed: usize,
    /// Rule body joins evaluated.
    pub joins: usize,
    /// Program version the run committed with.
    pub program_version: u64,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl RunReport {
    fn new(kind: RunKind) -> Self {
        Self {
            kind,
            derived: 0,
            retracted: 0,
            justifications_added: 0,
            justifications_removed: 0,
            joins: 0,
            program_version: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Returns `true` if the run changed no inferred data.
    pub fn is_noop(&self) -> bool {
        self.derived == 0
            && self.retracted == 0
            && self.justifications_added == 0
            && self.justifications_removed == 0
    }
}

/// The synchronous reasoning core.
///
/// Owns the active [`Program`] and runs every operation to completion on the
/// calling thread. [`ReasoningEngine`](crate::ReasoningEngine) wraps it in a
/// queue and a worker thread.
pub struct Reasoner {
    store: Arc<dyn StoreConnection>,
    program: Program,
    config: ReasonerConfig,
}

impl Reasoner {
    /// Creates a reasoner for `program`, which is persisted by the first run
    /// that changes it.
    pub fn new(
        store: Arc<dyn StoreConnection>,
        program: Program,
        config: ReasonerConfig,
    ) -> Result<Self> {
        program.validate()?;
        Ok(Self {
            store,
            program,
            config,
        })
    }

    /// Creates a reasoner for a program already persisted in the store.
    pub fn open(
        store: Arc<dyn StoreConnection>,
        program_name: &str,
        config: ReasonerConfig,
    ) -> Result<Self> {
        let program = {
            let tx = store.begin()?;
            let loaded = tx.load_program(program_name);
            tx.rollback()?;
            loaded?
        };
        let program = program
            .ok_or_else(|| Error::Program(format!("no stored program named '{}'", program_name)))?;
        info!(
            "opened program '{}' v{} with {} rules",
            program.name,
            program.version,
            program.len()
        );
        Self::new(store, program, config)
    }

    /// The active program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The configuration.
    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    /// The store this reasoner writes to.
    pub fn store(&self) -> &Arc<dyn StoreConnection> {
        &self.store
    }

    /// Brings inferred data up to date after the host committed base changes.
    pub fn after_commit(&mut self, added: Vec<Triple>, removed: Vec<Triple>) -> Result<RunReport> {
        let program = self.program.clone();
        self.execute(RunKind::AfterCommit, program, false, move |run| {
            let mut seeds = Vec::with_capacity(added.len());
            for triple in added {
                if run.tx.contains(&triple)? {
                    seeds.push((triple, None));
                } else {
                    debug!("skipping added triple {} that is not in the store", triple);
                }
            }
            run.saturate(seeds)?;
            run.retract(removed, Vec::new())
        })
    }

    /// Discards all inferred data and derives it again from the base triples.
    pub fn rerun_programs(&mut self) -> Result<RunReport> {
        let program = self.program.clone();
        self.execute(RunKind::ReRun, program, false, |run| run.full_evaluation())
    }

    /// Adds a rule to the program and derives its consequences.
    ///
    /// Invalid or duplicate rules are rejected before the store is touched.
    pub fn add_rule(&mut self, rule: Rule) -> Result<RunReport> {
        let mut program = self.program.clone();
        program.add_rule(rule.clone())?;
        self.execute(RunKind::AddRule, program, true, move |run| {
            let seeds = run.load_everything(Some(&rule.name))?;
            run.saturate(seeds)
        })
    }

    /// Removes a rule and retracts whatever only it justified.
    pub fn remove_rule(&mut self, name: &str) -> Result<RunReport> {
        let mut program = self.program.clone();
        program.remove_rule(name)?;
        let name = name.to_string();
        self.execute(RunKind::RemoveRule, program, true, move |run| {
            let mut touched = Vec::new();
            for justification in run.tx.list_justifications_by_rule(&name)? {
                if let Some(id) = justification.id {
                    run.tx.remove_justification(id)?;
                    run.report.justifications_removed += 1;
                }
                touched.push(justification.triple);
            }
            run.retract(Vec::new(), touched)
        })
    }

    /// Replaces the active program and re-evaluates everything.
    pub fn load_program(&mut self, program: Program) -> Result<RunReport> {
        program.validate()?;
        self.execute(RunKind::LoadProgram, program, true, |run| run.full_evaluation())
    }

    /// Explains how `triple` follows from base facts; `None` if it is absent.
    pub fn explain(&self, triple: &Triple) -> Result<Option<Proof>> {
        Proof::explain(self.store.as_ref(), triple)
    }

    fn execute<F>(
        &mut self,
        kind: RunKind,
        program: Program,
        persist: bool,
        work: F,
    ) -> Result<RunReport>
    where
        F: FnOnce(&mut Run<'_>) -> Result<()>,
    {
        let started = Instant::now();
        let tx = match self.store.begin() {
            Ok(tx) => tx,
            Err(e) => {
                error!("{:?} run could not begin: {}", kind, e);
                return Err(e);
            }
        };

        let mut run = Run {
            tx,
            working: TripleIndex::with_equivalence(self.config.equivalence),
            working_complete: false,
            program,
            config: &self.config,
            report: RunReport::new(kind),
        };

        let mut outcome = if persist {
            run.persist_program()
        } else {
            Ok(())
        };
        if outcome.is_ok() {
            outcome = work(&mut run);
        }

        let Run {
            tx,
            program,
            mut report,
            ..
        } = run;

        let outcome = match outcome {
            Ok(()) => tx.commit(),
            Err(e) => {
                if let Err(rollback) = tx.rollback() {
                    warn!("rollback after failed {:?} run also failed: {}", kind, rollback);
                }
                Err(e)
            }
        };

        match outcome {
            Ok(()) => {
                report.program_version = program.version;
                report.elapsed = started.elapsed();
                info!(
                    "{:?} run committed: +{} -{} inferred, +{} -{} justifications, {} joins in {:?}",
                    kind,
                    report.derived,
                    report.retracted,
                    report.justifications_added,
                    report.justifications_removed,
                    report.joins,
                    report.elapsed
                );
                self.program = program;
                Ok(report)
            }
            Err(e) => {
                error!("{:?} run failed and was rolled back: {}", kind, e);
                Err(e)
            }
        }
    }
}

/// State of one run: the open transaction, the program it runs with and the
/// triples it has seeded or derived.
struct Run<'a> {
    tx: Box<dyn StoreTransaction + 'a>,
    working: TripleIndex,
    /// Set when the working set holds every triple the transaction sees.
    working_complete: bool,
    program: Program,
    config: &'a ReasonerConfig,
    report: RunReport,
}

/// Pattern lookups for one run.
///
/// A complete working set answers alone. Otherwise it is a subset of what
/// the transaction sees, so the store answers.
struct RunLookup<'r> {
    working: &'r TripleIndex,
    complete: bool,
    tx: &'r dyn StoreTransaction,
}

impl Lookup for RunLookup<'_> {
    fn lookup(&self, pattern: &GraphPattern) -> Result<Vec<Triple>> {
        if self.complete {
            Ok(self.working.query(pattern))
        } else {
            self.tx.query(pattern)
        }
    }
}

impl Run<'_> {
    fn persist_program(&mut self) -> Result<()> {
        match self.tx.load_program(&self.program.name)? {
            Some(stored) => {
                if self.program.version <= stored.version {
                    self.program.version = stored.version + 1;
                }
                self.tx.update_program(&self.program)
            }
            None => self.tx.store_program(&self.program),
        }
    }

    /// Addition phase: pushes seeds and everything they derive through the
    /// rules until nothing new appears. A seed tagged with a rule name is
    /// only tried against that rule.
    fn saturate(&mut self, seeds: Vec<(Triple, Option<String>)>) -> Result<()> {
        self.working
            .extend(seeds.iter().map(|(triple, _)| triple.clone()));
        let mut queue: VecDeque<(Triple, Option<String>)> = seeds.into();

        while let Some((triple, only)) = queue.pop_front() {
            for (rule, index) in self.program.rules_for(&triple) {
                if only.as_deref().is_some_and(|name| name != rule.name) {
                    continue;
                }
                let lookup = RunLookup {
                    working: &self.working,
                    complete: self.working_complete,
                    tx: self.tx.as_ref(),
                };
                let matches = join_body(rule, index, &triple, &lookup)?;
                self.report.joins += 1;

                for body in matches {
                    for head in &rule.head {
                        let Some(derived) =
                            head.instantiate(&body.bindings, &self.config.inference_context)
                        else {
                            trace!("{}: head {} not instantiable", rule.name, head);
                            continue;
                        };

                        let justification =
                            Justification::new(derived.clone(), body.support.clone(), rule.name.clone());
                        if justification.is_circular() || self.tx.has_derivation(&justification)? {
                            continue;
                        }

                        if !self.tx.contains(&derived)? {
                            self.tx.add_inferred(&derived)?;
                            self.working.insert(derived.clone());
                            self.report.derived += 1;
                            debug!("derived {} by {}", derived, rule.name);
                            queue.push_back((derived, None));
                        }
                        self.tx.store_justification(justification)?;
                        self.report.justifications_added += 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// Removal phase.
    ///
    /// `removed` are base triples that are gone; `touched` are triples that
    /// lost a justification. Everything downstream of either is re-checked:
    /// what is still well-founded stays (and is re-materialized if absent),
    /// the rest is deleted together with the justifications that cite it.
    fn retract(&mut self, removed: Vec<Triple>, touched: Vec<Triple>) -> Result<()> {
        if removed.is_empty() && touched.is_empty() {
            return Ok(());
        }
        let removed: HashSet<Triple> = removed.into_iter().collect();

        // Downstream closure over justification edges.
        let mut affected: HashSet<Triple> = HashSet::new();
        let mut frontier: VecDeque<Triple> = removed.iter().cloned().chain(touched).collect();
        while let Some(triple) = frontier.pop_front() {
            if !affected.insert(triple.clone()) {
                continue;
            }
            for justification in self.tx.list_justifications_supported_by(&triple)? {
                if !affected.contains(&justification.triple) {
                    frontier.push_back(justification.triple);
                }
            }
        }
        trace!("retraction affects {} triples", affected.len());

        // Least fixpoint of well-foundedness over the affected set.
        let mut is_base: HashMap<Triple, bool> = HashMap::new();
        let mut justifications: HashMap<Triple, Vec<Justification>> = HashMap::new();
        for triple in &affected {
            let base = self.tx.contains(triple)? && !self.tx.is_inferred(triple)?;
            is_base.insert(triple.clone(), base);
            justifications.insert(triple.clone(), self.tx.list_justifications_for_triple(triple)?);
        }

        let mut grounded: HashSet<Triple> = affected
            .iter()
            .filter(|t| is_base.get(*t).copied().unwrap_or(false))
            .cloned()
            .collect();
        loop {
            let mut changed = false;
            for triple in &affected {
                if grounded.contains(triple) {
                    continue;
                }
                let mut proven = false;
                for justification in justifications.get(triple).into_iter().flatten() {
                    if self.supports_hold(justification, &affected, &grounded)? {
                        proven = true;
                        break;
                    }
                }
                if proven {
                    grounded.insert(triple.clone());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let mut ungrounded: Vec<&Triple> = affected.iter().filter(|t| !grounded.contains(*t)).collect();
        ungrounded.sort();
        for triple in ungrounded {
            let doomed: BTreeSet<_> = self
                .tx
                .list_justifications_for_triple(triple)?
                .into_iter()
                .chain(self.tx.list_justifications_supported_by(triple)?)
                .filter_map(|j| j.id)
                .collect();
            for id in doomed {
                if self.tx.remove_justification(id)?.is_some() {
                    self.report.justifications_removed += 1;
                }
            }
            if self.tx.is_inferred(triple)? && self.tx.remove_inferred(triple)? {
                self.report.retracted += 1;
                debug!("retracted {}", triple);
            }
        }

        let mut restored: Vec<&Triple> = grounded
            .iter()
            .filter(|t| removed.contains(*t))
            .collect();
        restored.sort();
        for triple in restored {
            if !self.tx.contains(triple)? {
                self.tx.add_inferred(triple)?;
                self.report.derived += 1;
                debug!("{} is no longer a base fact but is still derivable", triple);
            }
        }
        Ok(())
    }

    /// Returns `true` if every premise of `justification` is well-founded:
    /// grounded when it is itself under re-check, present otherwise.
    fn supports_hold(
        &self,
        justification: &Justification,
        affected: &HashSet<Triple>,
        grounded: &HashSet<Triple>,
    ) -> Result<bool> {
        if justification.supporting_rules.is_empty() {
            return Ok(false);
        }
        for support in &justification.supporting_triples {
            if affected.contains(support) {
                if !grounded.contains(support) {
                    return Ok(false);
                }
            } else if !self.tx.contains(support)? {
                return Err(Error::Consistency(format!(
                    "justification of {} cites {}, which is neither present nor being retracted",
                    justification.triple, support
                )));
            }
        }
        Ok(true)
    }

    /// Drops every justification and inferred triple, then saturates from the base.
    fn full_evaluation(&mut self) -> Result<()> {
        for justification in self.tx.list_justifications()? {
            if let Some(id) = justification.id {
                self.tx.remove_justification(id)?;
                self.report.justifications_removed += 1;
            }
        }
        for triple in self.tx.list_inferred()? {
            if self.tx.remove_inferred(&triple)? {
                self.report.retracted += 1;
            }
        }
        let seeds = self.load_everything(None)?;
        self.saturate(seeds)
    }

    /// Seeds from every triple in the store, optionally tagged with one rule.
    ///
    /// The working set then mirrors the store for the rest of the run, since
    /// every later addition goes through `saturate`. Under an equivalence
    /// coarser than `Quad` it cannot, and lookups keep going to the store.
    fn load_everything(&mut self, only: Option<&str>) -> Result<Vec<(Triple, Option<String>)>> {
        let triples = self.tx.query(&GraphPattern::any())?;
        self.working.clear();
        self.working_complete = self.working.equivalence() == Equivalence::Quad;
        trace!(
            "loaded {} triples into the working set (complete: {})",
            triples.len(),
            self.working_complete
        );
        Ok(triples
            .into_iter()
            .map(|t| (t, only.map(str::to_string)))
            .collect())
    }
}
