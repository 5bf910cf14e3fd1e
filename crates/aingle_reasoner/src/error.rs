//! Error types for the AIngle reasoner.

use thiserror::Error;

/// A specialized `Result` type for reasoner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Defines the errors that can occur while loading programs or running inference.
///
/// Errors are `Clone` so the engine can keep the last failure around for callers
/// that poll it after an asynchronous run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A rule or program is invalid and was not loaded.
    #[error("Program error: {0}")]
    Program(String),

    /// The underlying store failed; the run was rolled back.
    #[error("Store error: {0}")]
    Store(String),

    /// Justification bookkeeping disagrees with the stored triples.
    #[error("Consistency violation: {0}")]
    Consistency(String),

    /// A program or proof could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An error from the triple model.
    #[error("Graph error: {0}")]
    Graph(String),

    /// The worker thread could not be started.
    #[error("Worker error: {0}")]
    Worker(String),

    /// The engine no longer accepts work.
    #[error("Reasoning engine is shut down")]
    ShutDown,
}

impl Error {
    /// Returns `true` for rejected rules and programs.
    pub fn is_program_error(&self) -> bool {
        matches!(self, Error::Program(_))
    }

    /// Returns `true` for store failures.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Store(_))
    }

    /// Returns `true` for bookkeeping inconsistencies.
    pub fn is_consistency_violation(&self) -> bool {
        matches!(self, Error::Consistency(_))
    }
}

impl From<aingle_triples::Error> for Error {
    fn from(e: aingle_triples::Error) -> Self {
        Error::Graph(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Program("duplicate rule 'transitive'".to_string());
        assert!(err.to_string().contains("duplicate rule"));
        assert!(err.is_program_error());
        assert!(!err.is_store_error());
    }

    #[test]
    fn test_conversions() {
        let err: Error = aingle_triples::Error::InvalidPattern("not bound".into()).into();
        assert!(matches!(err, Error::Graph(_)));

        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_consistency_violation() {
        let err = Error::Consistency("justification 3 cites a missing triple".to_string());
        assert!(err.is_consistency_violation());
        assert_eq!(err.clone(), err);
    }
}
