//! AIngle Reasoner - incremental forward chaining with truth maintenance
//!
//! This crate keeps the inferred triples of a store in step with its base
//! triples. Every inferred triple carries at least one justification naming
//! the rule and the triples it was derived from, so a removal only retracts
//! what no longer follows from the data.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      AIngle Reasoner                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                 ReasoningEngine                       │   │
//! │  │  bounded queue │ worker thread │ stats │ shutdown     │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                           │                                  │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                    Reasoner                           │   │
//! │  │  Program │ join_body │ addition fixpoint │ retraction │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                           │                                  │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │          StoreConnection / StoreTransaction           │   │
//! │  │  base + inferred triples │ justifications │ programs  │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                                                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use aingle_reasoner::{BuiltinRules, MemoryStore, Program, Reasoner, ReasonerConfig};
//! use aingle_triples::{NodeId, Predicate, Triple};
//!
//! # fn main() -> aingle_reasoner::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let program = Program::new("social").with_rule(BuiltinRules::symmetric("knows", "knows"));
//! let mut reasoner = Reasoner::new(store.clone(), program, ReasonerConfig::default())?;
//!
//! let knows = Predicate::named("knows");
//! let alice_bob = Triple::link(NodeId::named("alice"), knows.clone(), NodeId::named("bob"));
//! let bob_alice = Triple::link(NodeId::named("bob"), knows, NodeId::named("alice"));
//!
//! let changes = store.commit_base(vec![alice_bob.clone()], vec![]);
//! reasoner.after_commit(changes.added, changes.removed)?;
//! assert!(store.contains(&bob_alice));
//!
//! let changes = store.commit_base(vec![], vec![alice_bob]);
//! reasoner.after_commit(changes.added, changes.removed)?;
//! assert!(!store.contains(&bob_alice));
//! # Ok(())
//! # }
//! ```

pub mod builtin;
pub mod config;
pub mod connection;
pub mod engine;
pub mod error;
pub mod join;
pub mod justification;
pub mod memory;
pub mod program;
pub mod proof;
pub mod reasoner;
pub mod rule;

// Re-exports
pub use builtin::BuiltinRules;
pub use config::ReasonerConfig;
pub use connection::{StoreConnection, StoreTransaction};
pub use engine::{EngineState, EngineStats, ReasoningEngine};
pub use error::{Error, Result};
pub use join::{join_body, BodyMatch, Lookup};
pub use justification::{Justification, JustificationGraph, JustificationId};
pub use memory::{ChangeSet, MemoryStore, MemoryTransaction};
pub use program::Program;
pub use proof::{Proof, ProofStep, StepKind};
pub use reasoner::{Reasoner, RunKind, RunReport};
pub use rule::{Bindings, Pattern, Rule, RuleBuilder, TriplePattern as RulePattern};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
