//! Reasoner configuration.

use aingle_triples::{Equivalence, GraphName};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default number of tasks the engine queue holds before callers block.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default name of the worker thread.
pub const DEFAULT_THREAD_NAME: &str = "aingle-reasoner";

/// Settings for the [`Reasoner`](crate::Reasoner) and
/// [`ReasoningEngine`](crate::ReasoningEngine).
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use aingle_reasoner::ReasonerConfig;
///
/// let config = ReasonerConfig::from_json(r#"{ "queue_capacity": 8 }"#).unwrap();
/// assert_eq!(config.queue_capacity, 8);
/// assert_eq!(config.thread_name, "aingle-reasoner");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Capacity of the bounded task queue.
    pub queue_capacity: usize,
    /// Name given to the worker thread.
    pub thread_name: String,
    /// Graph that receives derived triples whose head leaves the context open.
    pub inference_context: GraphName,
    /// Membership rule for the per-run working set.
    pub equivalence: Equivalence,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            inference_context: GraphName::Default,
            equivalence: Equivalence::Quad,
        }
    }
}

impl ReasonerConfig {
    /// Parses a configuration from JSON, filling in defaults for missing fields.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the queue capacity. Zero is raised to one.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Sets the graph derived triples land in.
    pub fn with_inference_context(mut self, context: GraphName) -> Self {
        self.inference_context = context;
        self
    }

    /// Sets the working-set equivalence.
    pub fn with_equivalence(mut self, equivalence: Equivalence) -> Self {
        self.equivalence = equivalence;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReasonerConfig::default();
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.inference_context, GraphName::Default);
        assert_eq!(config.equivalence, Equivalence::Quad);
    }

    #[test]
    fn test_from_json() {
        let config = ReasonerConfig::from_json(
            r#"{
                "thread_name": "inference",
                "inference_context": { "Named": { "Named": "urn:inferred" } },
                "equivalence": "ignore_context"
            }"#,
        )
        .unwrap();
        assert_eq!(config.thread_name, "inference");
        assert_eq!(config.inference_context, GraphName::named("urn:inferred"));
        assert_eq!(config.equivalence, Equivalence::IgnoreContext);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_invalid_json() {
        let err = ReasonerConfig::from_json("{ \"queue_capacity\": \"many\" }").unwrap_err();
        assert!(matches!(err, crate::Error::Serialization(_)));
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let config = ReasonerConfig::default().with_queue_capacity(0);
        assert_eq!(config.queue_capacity, 1);
    }
}
