//! Query patterns over quads.
//!
//! A `TriplePattern` constrains any subset of the four positions of a triple.
//! Unconstrained positions are wildcards.

use crate::{Error, GraphName, NodeId, Predicate, Result, Triple, Value};

/// A pattern for matching `(Subject, Predicate, Object, Context)` triples.
///
/// Any component can be `None`, which acts as a wildcard that matches any value.
///
/// # Examples
///
/// Match triples with specific subject and predicate:
///
/// ```
/// use aingle_triples::{TriplePattern, NodeId, Predicate};
///
/// let pattern = TriplePattern::subject(NodeId::named("user:alice"))
///     .with_predicate(Predicate::named("has_name"));
/// assert!(!pattern.is_exact());
/// ```
///
/// Match all triples (wildcard pattern):
///
/// ```
/// use aingle_triples::TriplePattern;
///
/// let pattern = TriplePattern::any();
/// assert!(pattern.is_wildcard());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TriplePattern {
    /// An optional constraint on the triple's subject.
    pub subject: Option<NodeId>,
    /// An optional constraint on the triple's predicate.
    pub predicate: Option<Predicate>,
    /// An optional constraint on the triple's object.
    pub object: Option<Value>,
    /// An optional constraint on the triple's graph.
    pub context: Option<GraphName>,
}

impl TriplePattern {
    /// Creates a new pattern that matches any triple.
    pub fn any() -> Self {
        Self::default()
    }

    /// Creates a new pattern that matches a specific subject.
    pub fn subject(subject: NodeId) -> Self {
        Self {
            subject: Some(subject),
            ..Default::default()
        }
    }

    /// Creates a new pattern that matches a specific predicate.
    pub fn predicate(predicate: Predicate) -> Self {
        Self {
            predicate: Some(predicate),
            ..Default::default()
        }
    }

    /// Creates a new pattern that matches a specific object.
    pub fn object(object: Value) -> Self {
        Self {
            object: Some(object),
            ..Default::default()
        }
    }

    /// Creates a new pattern that matches a specific graph.
    pub fn context(context: GraphName) -> Self {
        Self {
            context: Some(context),
            ..Default::default()
        }
    }

    /// The pattern that matches exactly one triple.
    pub fn exact(triple: &Triple) -> Self {
        Self {
            subject: Some(triple.subject.clone()),
            predicate: Some(triple.predicate.clone()),
            object: Some(triple.object.clone()),
            context: Some(triple.context.clone()),
        }
    }

    /// Adds a subject constraint to the pattern.
    pub fn with_subject(mut self, subject: NodeId) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Adds a predicate constraint to the pattern.
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Adds an object constraint to the pattern.
    pub fn with_object(mut self, object: Value) -> Self {
        self.object = Some(object);
        self
    }

    /// Adds a graph constraint to the pattern.
    pub fn with_context(mut self, context: GraphName) -> Self {
        self.context = Some(context);
        self
    }

    /// Returns `true` if the given [`Triple`] matches this pattern.
    ///
    /// ```
    /// use aingle_triples::{Triple, TriplePattern, NodeId, Predicate, Value};
    ///
    /// let triple = Triple::new(
    ///     NodeId::named("user:alice"),
    ///     Predicate::named("has_name"),
    ///     Value::literal("Alice"),
    /// );
    ///
    /// assert!(TriplePattern::subject(NodeId::named("user:alice")).matches(&triple));
    /// assert!(!TriplePattern::subject(NodeId::named("user:bob")).matches(&triple));
    /// ```
    pub fn matches(&self, triple: &Triple) -> bool {
        if let Some(ref s) = self.subject {
            if &triple.subject != s {
                return false;
            }
        }
        if let Some(ref p) = self.predicate {
            if &triple.predicate != p {
                return false;
            }
        }
        if let Some(ref o) = self.object {
            if &triple.object != o {
                return false;
            }
        }
        if let Some(ref c) = self.context {
            if &triple.context != c {
                return false;
            }
        }
        true
    }

    /// Returns `true` if all four components are specified.
    pub fn is_exact(&self) -> bool {
        self.subject.is_some()
            && self.predicate.is_some()
            && self.object.is_some()
            && self.context.is_some()
    }

    /// Returns `true` if the pattern is a wildcard (all components are `None`).
    pub fn is_wildcard(&self) -> bool {
        self.subject.is_none()
            && self.predicate.is_none()
            && self.object.is_none()
            && self.context.is_none()
    }

    /// Which positions are bound, in `[S, P, O, C]` order.
    pub fn bound_mask(&self) -> [bool; 4] {
        [
            self.subject.is_some(),
            self.predicate.is_some(),
            self.object.is_some(),
            self.context.is_some(),
        ]
    }

    /// Converts a fully bound pattern into the triple it denotes.
    pub fn to_triple(&self) -> Result<Triple> {
        match (&self.subject, &self.predicate, &self.object, &self.context) {
            (Some(s), Some(p), Some(o), Some(c)) => Ok(Triple {
                subject: s.clone(),
                predicate: p.clone(),
                object: o.clone(),
                context: c.clone(),
            }),
            _ => Err(Error::InvalidPattern(format!(
                "pattern {:?} is not fully bound",
                self.bound_mask()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple() -> Triple {
        Triple::link(NodeId::named("a"), Predicate::named("t"), NodeId::named("b"))
            .in_graph(GraphName::named("g"))
    }

    #[test]
    fn test_context_constraint() {
        let t = triple();
        assert!(TriplePattern::context(GraphName::named("g")).matches(&t));
        assert!(!TriplePattern::context(GraphName::Default).matches(&t));
    }

    #[test]
    fn test_exact_round_trip() {
        let t = triple();
        let pattern = TriplePattern::exact(&t);
        assert!(pattern.is_exact());
        assert_eq!(pattern.to_triple().unwrap(), t);
    }

    #[test]
    fn test_partial_pattern_is_not_a_triple() {
        let pattern = TriplePattern::subject(NodeId::named("a"));
        assert_eq!(pattern.bound_mask(), [true, false, false, false]);
        assert!(matches!(pattern.to_triple(), Err(Error::InvalidPattern(_))));
    }
}
