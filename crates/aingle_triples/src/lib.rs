//! AIngle Triples - quad model and in-memory triple index
//!
//! The data layer shared by the AIngle reasoner and the stores it runs
//! against. Every fact is a `(subject, predicate, object, context)` quad,
//! still called a "triple" throughout the API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      AIngle Triples                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                   TriplePattern                       │   │
//! │  │  S? │ P? │ O? │ C?    (None = wildcard)               │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                           │                                  │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                   TripleIndex                         │   │
//! │  │  ┌─────────┐  ┌─────────┐  ┌──────────────┐          │   │
//! │  │  │  SPOC   │  │  CSPO   │  │ membership   │          │   │
//! │  │  └─────────┘  └─────────┘  └──────────────┘          │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                                                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use aingle_triples::{GraphName, NodeId, Predicate, Triple, TripleIndex, TriplePattern};
//!
//! let mut index = TripleIndex::new();
//! index.insert(
//!     Triple::link(
//!         NodeId::named("user:alice"),
//!         Predicate::named("knows"),
//!         NodeId::named("user:bob"),
//!     )
//!     .in_graph(GraphName::named("social")),
//! );
//!
//! let found = index.query(&TriplePattern::context(GraphName::named("social")));
//! assert_eq!(found.len(), 1);
//! ```

pub mod error;
pub mod index;
pub mod node;
pub mod predicate;
pub mod query;
pub mod triple;
pub mod value;

// Re-exports
pub use error::{Error, Result};
pub use index::{AccessPath, Equivalence, IndexType, TripleIndex};
pub use node::NodeId;
pub use predicate::Predicate;
pub use query::TriplePattern;
pub use triple::{GraphName, Triple, TripleId};
pub use value::Value;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
