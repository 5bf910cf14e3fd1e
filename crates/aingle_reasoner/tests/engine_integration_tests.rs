//! Integration tests for the reasoning engine
//!
//! Drives the worker thread through the public handle and checks the
//! committed store state once the queue drains.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use aingle_reasoner::{
    BuiltinRules, EngineState, Error, MemoryStore, Program, ReasonerConfig, ReasoningEngine,
    Result, StoreConnection, StoreTransaction,
};
use aingle_triples::{NodeId, Predicate, Triple};
use parking_lot::Mutex;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn knows(s: &str, o: &str) -> Triple {
    Triple::link(NodeId::named(s), Predicate::named("knows"), NodeId::named(o))
}

fn social() -> Program {
    Program::new("social")
        .with_rule(BuiltinRules::transitive("transitive", "knows"))
        .with_rule(BuiltinRules::symmetric("symmetric", "knows"))
}

fn start(store: &Arc<MemoryStore>, program: Program) -> ReasoningEngine {
    init_logging();
    ReasoningEngine::start(store.clone(), program, ReasonerConfig::default()).unwrap()
}

fn settle(engine: &ReasoningEngine) {
    assert!(engine.wait_idle_timeout(Duration::from_secs(10)));
}

#[test]
fn test_end_to_end_commits() {
    let store = Arc::new(MemoryStore::new());
    let engine = start(&store, social());

    let changes = store.commit_base(vec![knows("alice", "bob"), knows("bob", "carol")], vec![]);
    engine.after_commit(changes.added, changes.removed).unwrap();
    settle(&engine);
    store.check_consistency().unwrap();

    for (s, o) in [
        ("bob", "alice"),
        ("carol", "bob"),
        ("alice", "carol"),
        ("carol", "alice"),
    ] {
        assert!(store.contains(&knows(s, o)), "missing ({} knows {})", s, o);
    }

    let changes = store.commit_base(vec![], vec![knows("bob", "carol")]);
    engine.after_commit(changes.added, changes.removed).unwrap();
    settle(&engine);
    store.check_consistency().unwrap();

    assert!(store.contains(&knows("bob", "alice")));
    assert!(!store.contains(&knows("carol", "bob")));
    assert!(!store.contains(&knows("alice", "carol")));
    assert!(!store.contains(&knows("carol", "alice")));

    let stats = engine.stats();
    assert_eq!(stats.runs, 2);
    assert_eq!(stats.failed_runs, 0);
    assert!(stats.derived > 0);
    assert!(stats.retracted > 0);
    assert!(engine.last_error().is_none());
}

#[test]
fn test_tasks_run_in_submission_order() {
    let store = Arc::new(MemoryStore::new());
    let engine = start(&store, Program::new("social"));

    let changes = store.commit_base(vec![knows("alice", "bob")], vec![]);
    engine.after_commit(changes.added, changes.removed).unwrap();
    engine
        .add_rule(BuiltinRules::symmetric("symmetric", "knows"))
        .unwrap();
    engine.remove_rule("symmetric").unwrap();
    engine
        .add_rule(BuiltinRules::symmetric("symmetric", "knows"))
        .unwrap();
    settle(&engine);

    assert!(engine.last_error().is_none());
    assert_eq!(engine.stats().runs, 4);
    assert_eq!(engine.program().rule_names(), vec!["symmetric"]);
    assert!(store.contains(&knows("bob", "alice")));
    store.check_consistency().unwrap();
}

#[test]
fn test_callers_on_many_threads() {
    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(ReasoningEngine::start(
        store.clone(),
        social(),
        ReasonerConfig::default().with_queue_capacity(2),
    )
    .unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let store = Arc::clone(&store);
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let a = format!("n{}", i);
                let b = format!("n{}", i + 1);
                let changes = store.commit_base(vec![knows(&a, &b)], vec![]);
                engine.after_commit(changes.added, changes.removed).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    settle(&engine);
    store.check_consistency().unwrap();

    assert!(store.contains(&knows("n0", "n4")));
    assert!(store.contains(&knows("n4", "n0")));
    assert_eq!(engine.stats().runs, 4);
}

#[test]
fn test_failed_run_is_reported_and_recoverable() {
    let store = Arc::new(MemoryStore::new());
    let engine = start(&store, social());

    store.fail_queries(true);
    let changes = store.commit_base(vec![knows("alice", "bob")], vec![]);
    engine.after_commit(changes.added, changes.removed).unwrap();
    settle(&engine);
    store.fail_queries(false);

    let err = engine.take_last_error().unwrap();
    assert!(err.is_store_error());
    assert_eq!(engine.stats().failed_runs, 1);
    assert!(store.inferred_triples().is_empty());

    engine.rerun_programs().unwrap();
    settle(&engine);
    assert!(engine.last_error().is_none());
    assert!(store.contains(&knows("bob", "alice")));
    store.check_consistency().unwrap();
}

#[test]
fn test_load_program_through_engine() {
    let store = Arc::new(MemoryStore::new());
    let engine = start(&store, social());
    store.insert_base([knows("alice", "bob")]);

    let invalid = Program::new("broken")
        .with_rule(BuiltinRules::symmetric("dup", "knows"))
        .with_rule(BuiltinRules::transitive("dup", "knows"));
    assert!(engine.load_program(invalid).unwrap_err().is_program_error());

    let symmetric = Program::new("social").with_rule(BuiltinRules::symmetric("symmetric", "knows"));
    engine.load_program(symmetric).unwrap();
    settle(&engine);

    assert_eq!(engine.program().rule_names(), vec!["symmetric"]);
    assert!(store.contains(&knows("bob", "alice")));
    assert_eq!(store.program("social").unwrap().unwrap().rule_names(), vec!["symmetric"]);
}

#[test]
fn test_open_engine_on_stored_program() {
    let store = Arc::new(MemoryStore::new());
    {
        let engine = start(&store, Program::new("social"));
        engine
            .add_rule(BuiltinRules::symmetric("symmetric", "knows"))
            .unwrap();
        settle(&engine);
    }

    let engine = ReasoningEngine::open(store.clone(), "social", ReasonerConfig::default()).unwrap();
    assert_eq!(engine.program().rule_names(), vec!["symmetric"]);

    let changes = store.commit_base(vec![knows("alice", "bob")], vec![]);
    engine.after_commit(changes.added, changes.removed).unwrap();
    settle(&engine);
    assert!(store.contains(&knows("bob", "alice")));

    let proof = engine.explain(&knows("bob", "alice")).unwrap().unwrap();
    assert_eq!(proof.rules_used(), vec!["symmetric"]);
}

/// Holds every transaction at `begin` while the gate is locked.
struct GatedStore {
    inner: Arc<MemoryStore>,
    gate: Mutex<()>,
}

impl StoreConnection for GatedStore {
    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>> {
        let _open = self.gate.lock();
        self.inner.begin()
    }
}

#[test]
fn test_queued_tasks_count_as_running() {
    init_logging();
    let store = Arc::new(MemoryStore::new());
    let gated = Arc::new(GatedStore {
        inner: store.clone(),
        gate: Mutex::new(()),
    });
    let engine = ReasoningEngine::start(gated.clone(), social(), ReasonerConfig::default()).unwrap();
    assert!(!engine.is_running());

    let closed = gated.gate.lock();
    let changes = store.commit_base(vec![knows("alice", "bob")], vec![]);
    engine.after_commit(changes.added, changes.removed).unwrap();
    assert!(engine.is_running());
    assert_eq!(engine.state(), EngineState::Running);

    engine.rerun_programs().unwrap();
    assert_eq!(engine.pending(), 2);
    assert!(engine.is_running());
    assert!(!store.contains(&knows("bob", "alice")));

    drop(closed);
    settle(&engine);
    assert!(!engine.is_running());
    assert_eq!(engine.state(), EngineState::Idle);
    assert!(store.contains(&knows("bob", "alice")));
    assert_eq!(engine.stats().runs, 2);
}

#[test]
fn test_shutdown_accounts_for_every_task() {
    let store = Arc::new(MemoryStore::new());
    let engine = start(&store, social());

    let mut queued = 0;
    for i in 0..20 {
        let changes = store.commit_base(vec![knows(&format!("m{}", i), "hub")], vec![]);
        engine.after_commit(changes.added, changes.removed).unwrap();
        queued += 1;
    }
    engine.shutdown();

    assert!(engine.is_shut_down());
    assert_eq!(engine.state(), EngineState::Idle);
    assert_eq!(engine.pending(), 0);
    let stats = engine.stats();
    assert_eq!(stats.runs + stats.failed_runs + stats.discarded_tasks, queued);
    assert_eq!(engine.after_commit(vec![], vec![]), Err(Error::ShutDown));

    // Whatever did run left the store consistent.
    store.check_consistency().unwrap();
}

#[test]
fn test_drop_shuts_down() {
    let store = Arc::new(MemoryStore::new());
    let engine = start(&store, social());
    engine.rerun_programs().unwrap();
    drop(engine);

    // The worker released the store; a new transaction commits cleanly.
    let tx = store.begin().unwrap();
    tx.commit().unwrap();
}
