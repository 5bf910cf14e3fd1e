//! The store interface the reasoner runs against.
//!
//! A run opens one transaction, reads and writes through it, and either
//! commits or rolls back. Base triples are written by the host; the reasoner
//! only touches inferred triples, justifications and programs.

use aingle_triples::{Triple, TriplePattern};

use crate::error::Result;
use crate::justification::{Justification, JustificationId};
use crate::program::Program;

/// A connection to a triple store that can host inferred data.
pub trait StoreConnection: Send + Sync {
    /// Opens a transaction.
    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>>;
}

/// One unit of work against the store.
///
/// Reads see the transaction's own writes. Nothing is visible to other
/// transactions until [`commit`](StoreTransaction::commit).
pub trait StoreTransaction {
    /// Returns `true` if any triple, base or inferred, matches `pattern`.
    fn has_triple(&self, pattern: &TriplePattern) -> Result<bool>;

    /// All triples, base and inferred, matching `pattern`.
    fn query(&self, pattern: &TriplePattern) -> Result<Vec<Triple>>;

    /// Returns `true` if `triple` is present as a base or inferred triple.
    fn contains(&self, triple: &Triple) -> Result<bool>;

    /// Returns `true` if `triple` is present only because it was inferred.
    fn is_inferred(&self, triple: &Triple) -> Result<bool>;

    /// Adds an inferred triple. Returns `false` if it was already inferred.
    fn add_inferred(&mut self, triple: &Triple) -> Result<bool>;

    /// Removes an inferred triple. Returns `false` if it was not inferred.
    fn remove_inferred(&mut self, triple: &Triple) -> Result<bool>;

    /// Stores a justification. An identical derivation yields the existing id.
    fn store_justification(&mut self, justification: Justification) -> Result<JustificationId>;

    /// Removes a justification, returning it if it existed.
    fn remove_justification(&mut self, id: JustificationId) -> Result<Option<Justification>>;

    /// Returns `true` if an identical derivation is stored.
    fn has_derivation(&self, justification: &Justification) -> Result<bool>;

    /// Justifications concluding `triple`.
    fn list_justifications_for_triple(&self, triple: &Triple) -> Result<Vec<Justification>>;

    /// Justifications citing `triple` as a premise.
    fn list_justifications_supported_by(&self, triple: &Triple) -> Result<Vec<Justification>>;

    /// Justifications produced by the named rule.
    fn list_justifications_by_rule(&self, rule: &str) -> Result<Vec<Justification>>;

    /// Every stored justification.
    fn list_justifications(&self) -> Result<Vec<Justification>>;

    /// Every inferred triple.
    fn list_inferred(&self) -> Result<Vec<Triple>>;

    /// Loads a program by name.
    fn load_program(&self, name: &str) -> Result<Option<Program>>;

    /// Stores a new program. Fails if one with the same name exists.
    fn store_program(&mut self, program: &Program) -> Result<()>;

    /// Replaces a stored program with a newer version.
    fn update_program(&mut self, program: &Program) -> Result<()>;

    /// Makes every change visible.
    fn commit(self: Box<Self>) -> Result<()>;

    /// Discards every change.
    fn rollback(self: Box<Self>) -> Result<()>;
}
