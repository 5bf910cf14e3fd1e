//! Asynchronous reasoning engine
//!
//! A single worker thread owns the [`Reasoner`] and consumes tasks from a
//! bounded queue in FIFO order. Callers on any thread enqueue work and return
//! immediately; they block only while the queue is full.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use aingle_triples::Triple;
use log::{error, info, trace, warn};
use parking_lot::{Condvar, Mutex, RwLock};
use serde::Serialize;

use crate::config::ReasonerConfig;
use crate::connection::StoreConnection;
use crate::error::{Error, Result};
use crate::program::Program;
use crate::proof::Proof;
use crate::reasoner::{Reasoner, RunReport};
use crate::rule::Rule;

/// Whether the engine has work outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EngineState {
    /// Nothing queued or executing.
    Idle,
    /// A task is queued or executing on the worker.
    Running,
}

/// Aggregate counters over the engine's lifetime.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStats {
    /// Runs committed.
    pub runs: usize,
    /// Runs rolled back after an error.
    pub failed_runs: usize,
    /// Queued tasks dropped by shutdown.
    pub discarded_tasks: usize,
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
    /// Report of the most recent committed run.
    pub last_run: Option<RunReport>,
}

impl EngineStats {
    fn record(&mut self, report: &RunReport) {
        self.runs += 1;
        self.derived += report.derived;
        self.retracted += report.retracted;
        self.justifications_added += report.justifications_added;
        self.justifications_removed += report.justifications_removed;
        self.joins += report.joins;
        self.last_run = Some(report.clone());
    }
}

enum Task {
    AfterCommit {
        added: Vec<Triple>,
        removed: Vec<Triple>,
    },
    ReRun,
    AddRule(Rule),
    RemoveRule(String),
    LoadProgram(Program),
}

impl Task {
    fn name(&self) -> &'static str {
        match self {
            Task::AfterCommit { .. } => "after-commit",
            Task::ReRun => "rerun",
            Task::AddRule(_) => "add-rule",
            Task::RemoveRule(_) => "remove-rule",
            Task::LoadProgram(_) => "load-program",
        }
    }

    fn run(self, reasoner: &mut Reasoner) -> Result<RunReport> {
        match self {
            Task::AfterCommit { added, removed } => reasoner.after_commit(added, removed),
            Task::ReRun => reasoner.rerun_programs(),
            Task::AddRule(rule) => reasoner.add_rule(rule),
            Task::RemoveRule(name) => reasoner.remove_rule(&name),
            Task::LoadProgram(program) => reasoner.load_program(program),
        }
    }
}

/// State shared between the handle and the worker.
struct Shared {
    stopping: AtomicBool,
    pending: Mutex<usize>,
    idle: Condvar,
    stats: RwLock<EngineStats>,
    last_error: Mutex<Option<Error>>,
    program: RwLock<Program>,
}

impl Shared {
    fn finish_task(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.idle.notify_all();
        }
    }
}

/// Host-facing reasoning engine with a bounded queue and one worker thread.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use aingle_reasoner::{BuiltinRules, MemoryStore, Program, ReasonerConfig, ReasoningEngine};
/// use aingle_triples::{NodeId, Predicate, Triple};
///
/// # fn main() -> aingle_reasoner::Result<()> {
/// let store = Arc::new(MemoryStore::new());
/// let program = Program::new("family").with_rule(BuiltinRules::transitive("ancestor", "ancestorOf"));
/// let engine = ReasoningEngine::start(store.clone(), program, ReasonerConfig::default())?;
///
/// let p = Predicate::named("ancestorOf");
/// let changes = store.commit_base(
///     vec![
///         Triple::link(NodeId::named("ann"), p.clone(), NodeId::named("bob")),
///         Triple::link(NodeId::named("bob"), p.clone(), NodeId::named("cid")),
///     ],
///     vec![],
/// );
/// engine.after_commit(changes.added, changes.removed)?;
/// engine.wait_idle();
///
/// assert!(store.contains(&Triple::link(NodeId::named("ann"), p, NodeId::named("cid"))));
/// engine.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct ReasoningEngine {
    shared: Arc<Shared>,
    sender: Mutex<Option<SyncSender<Task>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    store: Arc<dyn StoreConnection>,
}

impl ReasoningEngine {
    /// Starts an engine for `program` on `store`.
    pub fn start(
        store: Arc<dyn StoreConnection>,
        program: Program,
        config: ReasonerConfig,
    ) -> Result<Self> {
        let reasoner = Reasoner::new(Arc::clone(&store), program, config)?;
        Self::spawn(store, reasoner)
    }

    /// Starts an engine for a program already persisted in `store`.
    pub fn open(
        store: Arc<dyn StoreConnection>,
        program_name: &str,
        config: ReasonerConfig,
    ) -> Result<Self> {
        let reasoner = Reasoner::open(Arc::clone(&store), program_name, config)?;
        Self::spawn(store, reasoner)
    }

    fn spawn(store: Arc<dyn StoreConnection>, reasoner: Reasoner) -> Result<Self> {
        let config = reasoner.config().clone();
        let (sender, receiver) = mpsc::sync_channel(config.queue_capacity.max(1));
        let shared = Arc::new(Shared {
            stopping: AtomicBool::new(false),
            pending: Mutex::new(0),
            idle: Condvar::new(),
            stats: RwLock::new(EngineStats::default()),
            last_error: Mutex::new(None),
            program: RwLock::new(reasoner.program().clone()),
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || worker_loop(reasoner, receiver, worker_shared))
            .map_err(|e| Error::Worker(format!("failed to spawn {}: {}", config.thread_name, e)))?;

        info!(
            "reasoning engine started on '{}' (queue capacity {})",
            config.thread_name, config.queue_capacity
        );

        Ok(Self {
            shared,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(handle)),
            store,
        })
    }

    /// Enqueues incremental evaluation of a base commit.
    pub fn after_commit(&self, added: Vec<Triple>, removed: Vec<Triple>) -> Result<()> {
        self.enqueue(Task::AfterCommit { added, removed })
    }

    /// Enqueues a full re-evaluation.
    pub fn rerun_programs(&self) -> Result<()> {
        self.enqueue(Task::ReRun)
    }

    /// Enqueues adding a rule. Malformed rules are rejected immediately;
    /// a name clash is reported through [`last_error`](Self::last_error).
    pub fn add_rule(&self, rule: Rule) -> Result<()> {
        rule.validate()?;
        self.enqueue(Task::AddRule(rule))
    }

    /// Enqueues removing a rule. An unknown name is reported through
    /// [`last_error`](Self::last_error).
    pub fn remove_rule(&self, name: impl Into<String>) -> Result<()> {
        self.enqueue(Task::RemoveRule(name.into()))
    }

    /// Enqueues replacing the program. Invalid programs are rejected immediately.
    pub fn load_program(&self, program: Program) -> Result<()> {
        program.validate()?;
        self.enqueue(Task::LoadProgram(program))
    }

    fn enqueue(&self, task: Task) -> Result<()> {
        let sender = self.sender.lock().clone().ok_or(Error::ShutDown)?;
        *self.shared.pending.lock() += 1;
        let name = task.name();
        if sender.send(task).is_err() {
            self.shared.finish_task();
            return Err(Error::ShutDown);
        }
        trace!("queued {} task", name);
        Ok(())
    }

    /// Returns `true` from the moment a task is accepted until the queue
    /// has drained.
    pub fn is_running(&self) -> bool {
        self.pending() > 0
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        if self.is_running() {
            EngineState::Running
        } else {
            EngineState::Idle
        }
    }

    /// Tasks queued or running.
    pub fn pending(&self) -> usize {
        *self.shared.pending.lock()
    }

    /// Blocks until every queued task has finished.
    pub fn wait_idle(&self) {
        let mut pending = self.shared.pending.lock();
        while *pending > 0 {
            self.shared.idle.wait(&mut pending);
        }
    }

    /// Like [`wait_idle`](Self::wait_idle) with a limit. Returns `false` on timeout.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let mut pending = self.shared.pending.lock();
        while *pending > 0 {
            if self.shared.idle.wait_for(&mut pending, timeout).timed_out() {
                return *pending == 0;
            }
        }
        true
    }

    /// Stops accepting tasks, lets the in-flight run finish, discards the
    /// rest of the queue and joins the worker. Safe to call more than once.
    pub fn shutdown(&self) {
        self.shared.stopping.store(true, Ordering::SeqCst);
        self.sender.lock().take();
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                error!("reasoning worker panicked");
            }
            info!("reasoning engine shut down");
        }
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shared.stopping.load(Ordering::SeqCst)
    }

    /// The program as of the last committed run.
    pub fn program(&self) -> Program {
        self.shared.program.read().clone()
    }

    /// Lifetime counters.
    pub fn stats(&self) -> EngineStats {
        self.shared.stats.read().clone()
    }

    /// The error of the most recent failed run, if any.
    pub fn last_error(&self) -> Option<Error> {
        self.shared.last_error.lock().clone()
    }

    /// Clears and returns the last error.
    pub fn take_last_error(&self) -> Option<Error> {
        self.shared.last_error.lock().take()
    }

    /// Explains a committed triple; reads the store directly.
    pub fn explain(&self, triple: &Triple) -> Result<Option<Proof>> {
        Proof::explain(self.store.as_ref(), triple)
    }
}

impl Drop for ReasoningEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(mut reasoner: Reasoner, receiver: Receiver<Task>, shared: Arc<Shared>) {
    info!("reasoning worker started");
    while let Ok(task) = receiver.recv() {
        if shared.stopping.load(Ordering::SeqCst) {
            warn!("discarding queued {} task on shutdown", task.name());
            shared.stats.write().discarded_tasks += 1;
            shared.finish_task();
            continue;
        }

        match task.run(&mut reasoner) {
            Ok(report) => {
                shared.stats.write().record(&report);
                *shared.program.write() = reasoner.program().clone();
            }
            Err(e) => {
                shared.stats.write().failed_runs += 1;
                *shared.last_error.lock() = Some(e);
            }
        }
        shared.finish_task();
    }
    info!("reasoning worker stopped");
}
