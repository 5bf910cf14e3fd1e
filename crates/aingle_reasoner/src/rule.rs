//! Rule definitions for the reasoner
//!
//! A rule is a conjunction of body patterns and a list of head patterns.
//! Whenever every body pattern matches some triple under one consistent set
//! of variable bindings, each head pattern is instantiated with those
//! bindings and the resulting triples are derived.

use std::collections::BTreeMap;
use std::fmt;

use aingle_triples::{GraphName, NodeId, Predicate, Triple, TriplePattern as GraphPattern, Value};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The IRI a rule pattern uses to name the default graph in the context position.
pub const DEFAULT_GRAPH_IRI: &str = "urn:x-arq:DefaultGraph";

/// A single position of a rule pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pattern {
    /// Match any value; in a head context, use the configured inference graph.
    Any,
    /// Match exactly this value.
    Bound(Value),
    /// Match anything and bind it, or match the value already bound.
    Variable(String),
}

impl Pattern {
    /// A variable position.
    pub fn var(name: impl Into<String>) -> Self {
        Pattern::Variable(name.into())
    }

    /// A constant named node (subject, predicate, object or graph).
    pub fn node(name: impl Into<String>) -> Self {
        Pattern::Bound(Value::named(name))
    }

    /// A constant value.
    pub fn value(value: impl Into<Value>) -> Self {
        Pattern::Bound(value.into())
    }

    /// The default graph as a constant context.
    pub fn default_graph() -> Self {
        Pattern::node(DEFAULT_GRAPH_IRI)
    }

    /// The variable name, if this is a variable.
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Pattern::Variable(name) => Some(name),
            _ => None,
        }
    }

    /// Unifies this position with `value`, extending `bindings` on success.
    fn unify(&self, value: Value, bindings: &mut Bindings) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Bound(bound) => *bound == value,
            Pattern::Variable(name) => match bindings.get(name) {
                Some(existing) => *existing == value,
                None => {
                    bindings.bind(name.clone(), value);
                    true
                }
            },
        }
    }

    /// The value this position denotes under `bindings`, if it is fixed.
    fn resolve<'a>(&'a self, bindings: &'a Bindings) -> Option<&'a Value> {
        match self {
            Pattern::Any => None,
            Pattern::Bound(value) => Some(value),
            Pattern::Variable(name) => bindings.get(name),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Any => write!(f, "_"),
            Pattern::Bound(value) => write!(f, "{}", value),
            Pattern::Variable(name) => write!(f, "?{}", name),
        }
    }
}

/// Converts a graph name into the value a rule pattern sees in the context position.
pub fn graph_value(context: &GraphName) -> Value {
    match context {
        GraphName::Default => Value::named(DEFAULT_GRAPH_IRI),
        GraphName::Named(node) => Value::Node(node.clone()),
    }
}

/// The inverse of [`graph_value`]. Literals cannot name graphs.
pub fn value_graph(value: &Value) -> Option<GraphName> {
    match value {
        Value::Node(NodeId::Named(name)) if name == DEFAULT_GRAPH_IRI => Some(GraphName::Default),
        Value::Node(node) => Some(GraphName::Named(node.clone())),
        _ => None,
    }
}

/// A pattern over the four positions of a triple, used in rule bodies and heads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriplePattern {
    /// Subject position.
    pub subject: Pattern,
    /// Predicate position.
    pub predicate: Pattern,
    /// Object position.
    pub object: Pattern,
    /// Graph position.
    pub context: Pattern,
}

impl TriplePattern {
    /// Creates a pattern that leaves the graph open.
    pub fn new(subject: Pattern, predicate: Pattern, object: Pattern) -> Self {
        Self {
            subject,
            predicate,
            object,
            context: Pattern::Any,
        }
    }

    /// Restricts the graph position.
    pub fn in_context(mut self, context: Pattern) -> Self {
        self.context = context;
        self
    }

    /// Unifies the pattern with `triple` starting from empty bindings.
    ///
    /// ```
    /// use aingle_reasoner::rule::{Pattern, TriplePattern};
    /// use aingle_triples::{NodeId, Predicate, Triple, Value};
    ///
    /// let pattern = TriplePattern::new(Pattern::var("x"), Pattern::node("knows"), Pattern::var("y"));
    /// let triple = Triple::link(NodeId::named("alice"), Predicate::named("knows"), NodeId::named("bob"));
    ///
    /// let bindings = pattern.bind(&triple).unwrap();
    /// assert_eq!(bindings.get("x"), Some(&Value::named("alice")));
    /// ```
    pub fn bind(&self, triple: &Triple) -> Option<Bindings> {
        let mut bindings = Bindings::new();
        if self.matches_with(triple, &mut bindings) {
            Some(bindings)
        } else {
            None
        }
    }

    /// Unifies the pattern with `triple`, extending `bindings`.
    ///
    /// On failure `bindings` is left untouched.
    pub fn matches_with(&self, triple: &Triple, bindings: &mut Bindings) -> bool {
        let mut extended = bindings.clone();
        let ok = self
            .subject
            .unify(Value::Node(triple.subject.clone()), &mut extended)
            && self
                .predicate
                .unify(Value::from(triple.predicate.clone()), &mut extended)
            && self.object.unify(triple.object.clone(), &mut extended)
            && self
                .context
                .unify(graph_value(&triple.context), &mut extended);
        if ok {
            *bindings = extended;
        }
        ok
    }

    /// Turns the pattern into a store query, substituting bound variables.
    ///
    /// Returns `None` when a bound value cannot occupy its position (a literal
    /// bound where a node is required), since such a pattern matches nothing.
    pub fn resolve(&self, bindings: &Bindings) -> Option<GraphPattern> {
        let subject = match self.subject.resolve(bindings) {
            Some(value) => Some(value.as_node()?.clone()),
            None => None,
        };
        let predicate = match self.predicate.resolve(bindings) {
            Some(value) => Some(value.as_predicate()?),
            None => None,
        };
        let object = self.object.resolve(bindings).cloned();
        let context = match self.context.resolve(bindings) {
            Some(value) => Some(value_graph(value)?),
            None => None,
        };
        Some(GraphPattern {
            subject,
            predicate,
            object,
            context,
        })
    }

    /// Builds the triple this head pattern denotes under `bindings`.
    ///
    /// Returns `None` when a position is still unbound or holds a value that
    /// cannot occupy it. An open context places the triple in `default_context`.
    pub fn instantiate(&self, bindings: &Bindings, default_context: &GraphName) -> Option<Triple> {
        let subject = self.subject.resolve(bindings)?.as_node()?.clone();
        let predicate: Predicate = self.predicate.resolve(bindings)?.as_predicate()?;
        let object = self.object.resolve(bindings)?.clone();
        let context = match &self.context {
            Pattern::Any => default_context.clone(),
            other => value_graph(other.resolve(bindings)?)?,
        };
        Some(Triple {
            subject,
            predicate,
            object,
            context,
        })
    }

    /// Variables in `[S, P, O, C]` order, without duplicates.
    pub fn variables(&self) -> Vec<&str> {
        let mut vars = Vec::new();
        for position in self.positions() {
            if let Some(name) = position.as_variable() {
                if !vars.contains(&name) {
                    vars.push(name);
                }
            }
        }
        vars
    }

    fn positions(&self) -> [&Pattern; 4] {
        [&self.subject, &self.predicate, &self.object, &self.context]
    }

    /// Checks constants against the positions they occupy.
    fn validate(&self, rule: &str) -> Result<()> {
        let node_only = [
            ("subject", &self.subject),
            ("predicate", &self.predicate),
            ("context", &self.context),
        ];
        for (position, pattern) in node_only {
            if let Pattern::Bound(value) = pattern {
                let ok = match position {
                    "predicate" => value.as_predicate().is_some(),
                    "context" => value_graph(value).is_some(),
                    _ => value.is_node(),
                };
                if !ok {
                    return Err(Error::Program(format!(
                        "rule '{}': {} cannot be the {} of a triple",
                        rule, value, position
                    )));
                }
            }
            if let Pattern::Variable(name) = pattern {
                if name.is_empty() {
                    return Err(Error::Program(format!(
                        "rule '{}': empty variable name",
                        rule
                    )));
                }
            }
        }
        if let Pattern::Variable(name) = &self.object {
            if name.is_empty() {
                return Err(Error::Program(format!(
                    "rule '{}': empty variable name",
                    rule
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context {
            Pattern::Any => write!(f, "({} {} {})", self.subject, self.predicate, self.object),
            _ => write!(
                f,
                "({} {} {} {})",
                self.subject, self.predicate, self.object, self.context
            ),
        }
    }
}

/// Variable bindings during rule evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bindings {
    values: BTreeMap<String, Value>,
}

impl Bindings {
    /// Create empty bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to a value
    pub fn bind(&mut self, var: impl Into<String>, value: Value) {
        self.values.insert(var.into(), value);
    }

    /// Get a bound value
    pub fn get(&self, var: &str) -> Option<&Value> {
        self.values.get(var)
    }

    /// Check if a variable is bound
    pub fn is_bound(&self, var: &str) -> bool {
        self.values.contains_key(var)
    }

    /// Number of bound variables
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if nothing is bound
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(variable, value)` pairs in variable order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// An inference rule: when every body pattern matches, derive every head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique name within a program.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Conjunction of patterns that must all match.
    pub body: Vec<TriplePattern>,
    /// Patterns instantiated for each body match.
    pub head: Vec<TriplePattern>,
}

impl Rule {
    /// Creates an empty rule.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            body: Vec::new(),
            head: Vec::new(),
        }
    }

    /// Starts building a rule with a fluent API.
    pub fn builder(name: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(name)
    }

    /// Variables bound by the body, in first-occurrence order.
    pub fn body_variables(&self) -> Vec<&str> {
        let mut vars = Vec::new();
        for pattern in &self.body {
            for var in pattern.variables() {
                if !vars.contains(&var) {
                    vars.push(var);
                }
            }
        }
        vars
    }

    /// Rejects rules that could never fire or that would derive ill-formed triples.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Program("rule name must not be empty".to_string()));
        }
        if self.body.is_empty() {
            return Err(Error::Program(format!("rule '{}' has an empty body", self.name)));
        }
        if self.head.is_empty() {
            return Err(Error::Program(format!("rule '{}' has an empty head", self.name)));
        }

        for pattern in self.body.iter().chain(self.head.iter()) {
            pattern.validate(&self.name)?;
        }

        let body_vars = self.body_variables();
        for head in &self.head {
            if matches!(head.subject, Pattern::Any)
                || matches!(head.predicate, Pattern::Any)
                || matches!(head.object, Pattern::Any)
            {
                return Err(Error::Program(format!(
                    "rule '{}': head {} leaves a position open",
                    self.name, head
                )));
            }
            for var in head.variables() {
                if !body_vars.contains(&var) {
                    return Err(Error::Program(format!(
                        "rule '{}': head variable ?{} does not occur in the body",
                        self.name, var
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |patterns: &[TriplePattern]| {
            patterns
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "[{}: {} -> {}]", self.name, join(&self.body), join(&self.head))
    }
}

/// A builder for creating `Rule`s using a fluent API.
///
/// ```
/// use aingle_reasoner::rule::{Pattern, Rule, TriplePattern};
///
/// let rule = Rule::builder("symmetric")
///     .description("knows is symmetric")
///     .when(TriplePattern::new(Pattern::var("x"), Pattern::node("knows"), Pattern::var("y")))
///     .then(TriplePattern::new(Pattern::var("y"), Pattern::node("knows"), Pattern::var("x")))
///     .build();
/// assert!(rule.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    rule: Rule,
}

impl RuleBuilder {
    /// Creates a new `RuleBuilder` for a rule with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            rule: Rule::new(name),
        }
    }

    /// Sets the description for the rule being built.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.rule.description = desc.into();
        self
    }

    /// Adds a body pattern.
    pub fn when(mut self, pattern: TriplePattern) -> Self {
        self.rule.body.push(pattern);
        self
    }

    /// Adds a head pattern.
    pub fn then(mut self, pattern: TriplePattern) -> Self {
        self.rule.head.push(pattern);
        self
    }

    /// Builds and returns the final `Rule`.
    pub fn build(self) -> Rule {
        self.rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(s: &str, p: &str, o: &str) -> Triple {
        Triple::link(NodeId::named(s), Predicate::named(p), NodeId::named(o))
    }

    fn knows(s: Pattern, o: Pattern) -> TriplePattern {
        TriplePattern::new(s, Pattern::node("knows"), o)
    }

    #[test]
    fn test_bind() {
        let pattern = knows(Pattern::var("x"), Pattern::var("y"));
        let bindings = pattern.bind(&link("alice", "knows", "bob")).unwrap();
        assert_eq!(bindings.get("x"), Some(&Value::named("alice")));
        assert_eq!(bindings.get("y"), Some(&Value::named("bob")));
        assert_eq!(bindings.len(), 2);

        assert!(pattern.bind(&link("alice", "likes", "bob")).is_none());
    }

    #[test]
    fn test_repeated_variable_must_agree() {
        let pattern = knows(Pattern::var("x"), Pattern::var("x"));
        assert!(pattern.bind(&link("alice", "knows", "alice")).is_some());
        assert!(pattern.bind(&link("alice", "knows", "bob")).is_none());
    }

    #[test]
    fn test_matches_with_keeps_bindings_on_failure() {
        let pattern = knows(Pattern::var("x"), Pattern::var("y"));
        let mut bindings = Bindings::new();
        bindings.bind("x", Value::named("carol"));

        assert!(!pattern.matches_with(&link("alice", "knows", "bob"), &mut bindings));
        assert_eq!(bindings.len(), 1);

        assert!(pattern.matches_with(&link("carol", "knows", "bob"), &mut bindings));
        assert_eq!(bindings.get("y"), Some(&Value::named("bob")));
    }

    #[test]
    fn test_context_variable() {
        let pattern = knows(Pattern::var("x"), Pattern::var("y")).in_context(Pattern::var("g"));
        let scoped = link("a", "knows", "b").in_graph(GraphName::named("g1"));
        let bindings = pattern.bind(&scoped).unwrap();
        assert_eq!(bindings.get("g"), Some(&Value::named("g1")));

        let bindings = pattern.bind(&link("a", "knows", "b")).unwrap();
        assert_eq!(bindings.get("g"), Some(&Value::named(DEFAULT_GRAPH_IRI)));

        let only_default = knows(Pattern::Any, Pattern::Any).in_context(Pattern::default_graph());
        assert!(only_default.bind(&link("a", "knows", "b")).is_some());
        assert!(only_default.bind(&scoped).is_none());
    }

    #[test]
    fn test_resolve() {
        let pattern = knows(Pattern::var("x"), Pattern::var("y"));
        let mut bindings = Bindings::new();
        bindings.bind("y", Value::named("bob"));

        let query = pattern.resolve(&bindings).unwrap();
        assert_eq!(query.subject, None);
        assert_eq!(query.predicate, Some(Predicate::named("knows")));
        assert_eq!(query.object, Some(Value::named("bob")));
        assert_eq!(query.context, None);

        // A literal bound into the subject position can never match.
        let mut literal = Bindings::new();
        literal.bind("x", Value::literal("not a node"));
        assert!(pattern.resolve(&literal).is_none());
    }

    #[test]
    fn test_instantiate() {
        let head = knows(Pattern::var("y"), Pattern::var("x"));
        let mut bindings = Bindings::new();
        bindings.bind("x", Value::named("alice"));
        bindings.bind("y", Value::named("bob"));

        let inferred = GraphName::named("inferred");
        let triple = head.instantiate(&bindings, &inferred).unwrap();
        assert_eq!(triple, link("bob", "knows", "alice").in_graph(inferred.clone()));

        let pinned = head.clone().in_context(Pattern::default_graph());
        assert!(pinned
            .instantiate(&bindings, &inferred)
            .unwrap()
            .context
            .is_default());

        let mut partial = Bindings::new();
        partial.bind("x", Value::named("alice"));
        assert!(head.instantiate(&partial, &inferred).is_none());

        let mut literal_subject = bindings.clone();
        literal_subject.bind("y", Value::integer(3));
        assert!(head.instantiate(&literal_subject, &inferred).is_none());
    }

    #[test]
    fn test_validate() {
        let ok = Rule::builder("ok")
            .when(knows(Pattern::var("x"), Pattern::var("y")))
            .then(knows(Pattern::var("y"), Pattern::var("x")))
            .build();
        assert!(ok.validate().is_ok());

        let unsafe_head = Rule::builder("unsafe")
            .when(knows(Pattern::var("x"), Pattern::var("y")))
            .then(knows(Pattern::var("z"), Pattern::var("x")))
            .build();
        assert!(unsafe_head.validate().unwrap_err().is_program_error());

        let open_head = Rule::builder("open")
            .when(knows(Pattern::var("x"), Pattern::var("y")))
            .then(knows(Pattern::Any, Pattern::var("x")))
            .build();
        assert!(open_head.validate().is_err());

        let literal_subject = Rule::builder("literal")
            .when(TriplePattern::new(
                Pattern::value("alice"),
                Pattern::node("knows"),
                Pattern::var("y"),
            ))
            .then(knows(Pattern::var("y"), Pattern::var("y")))
            .build();
        assert!(literal_subject.validate().is_err());

        assert!(Rule::new("empty").validate().is_err());
        assert!(Rule::builder(" ")
            .when(knows(Pattern::var("x"), Pattern::var("y")))
            .then(knows(Pattern::var("y"), Pattern::var("x")))
            .build()
            .validate()
            .is_err());
    }

    #[test]
    fn test_display() {
        let rule = Rule::builder("sym")
            .when(knows(Pattern::var("x"), Pattern::var("y")))
            .then(knows(Pattern::var("y"), Pattern::var("x")))
            .build();
        assert_eq!(
            rule.to_string(),
            "[sym: (?x <knows> ?y) -> (?y <knows> ?x)]"
        );
    }

    #[test]
    fn test_serde() {
        let rule = Rule::builder("sym")
            .when(knows(Pattern::var("x"), Pattern::var("y")))
            .then(knows(Pattern::var("y"), Pattern::var("x")))
            .build();
        let json = serde_json::to_string(&rule).unwrap();
        let back: Rule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }
}
