//! Programs: named, versioned collections of rules.

use aingle_triples::Triple;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rule::Rule;

/// A named set of rules evaluated together.
///
/// Every successful `add_rule` or `remove_rule` bumps `version`, which the
/// store uses to reject stale updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Name the program is stored under.
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Monotonic revision number.
    pub version: u64,
    /// Rules in evaluation order.
    pub rules: Vec<Rule>,
    /// When the program last changed.
    pub updated_at: DateTime<Utc>,
}

impl Program {
    /// Create a new empty program at version 0.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: 0,
            rules: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends a rule while building, without validation or a version bump.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Checks every rule and that rule names are unique.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Program("program name must not be empty".to_string()));
        }
        for (i, rule) in self.rules.iter().enumerate() {
            rule.validate()?;
            if self.rules[..i].iter().any(|r| r.name == rule.name) {
                return Err(Error::Program(format!(
                    "program '{}' defines rule '{}' twice",
                    self.name, rule.name
                )));
            }
        }
        Ok(())
    }

    /// Adds a validated rule and bumps the version.
    pub fn add_rule(&mut self, rule: Rule) -> Result<()> {
        rule.validate()?;
        if self.rule(&rule.name).is_some() {
            return Err(Error::Program(format!(
                "rule '{}' already exists in program '{}'",
                rule.name, self.name
            )));
        }
        self.rules.push(rule);
        self.touch();
        Ok(())
    }

    /// Removes a rule by name and bumps the version.
    pub fn remove_rule(&mut self, name: &str) -> Result<Rule> {
        let pos = self
            .rules
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| {
                Error::Program(format!(
                    "rule '{}' does not exist in program '{}'",
                    name, self.name
                ))
            })?;
        let rule = self.rules.remove(pos);
        self.touch();
        Ok(rule)
    }

    /// Find a rule by name
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Names of all rules in order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    /// Every `(rule, body position)` pair the triple unifies with.
    pub fn rules_for(&self, triple: &Triple) -> Vec<(&Rule, usize)> {
        let mut hits = Vec::new();
        for rule in &self.rules {
            for (i, pattern) in rule.body.iter().enumerate() {
                if pattern.bind(triple).is_some() {
                    hits.push((rule, i));
                }
            }
        }
        hits
    }

    /// Count of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Serializes the program.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes and validates a program.
    pub fn from_json(json: &str) -> Result<Self> {
        let program: Program = serde_json::from_str(json)?;
        program.validate()?;
        Ok(program)
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Pattern, TriplePattern};
    use aingle_triples::{NodeId, Predicate};

    fn rule(name: &str, predicate: &str) -> Rule {
        Rule::builder(name)
            .when(TriplePattern::new(
                Pattern::var("x"),
                Pattern::node(predicate),
                Pattern::var("y"),
            ))
            .then(TriplePattern::new(
                Pattern::var("y"),
                Pattern::node(predicate),
                Pattern::var("x"),
            ))
            .build()
    }

    #[test]
    fn test_add_and_remove_bump_version() {
        let mut program = Program::new("social");
        assert_eq!(program.version, 0);

        program.add_rule(rule("sym", "knows")).unwrap();
        assert_eq!(program.version, 1);
        assert_eq!(program.len(), 1);

        let removed = program.remove_rule("sym").unwrap();
        assert_eq!(removed.name, "sym");
        assert_eq!(program.version, 2);
        assert!(program.is_empty());
    }

    #[test]
    fn test_duplicate_and_unknown_rules() {
        let mut program = Program::new("social");
        program.add_rule(rule("sym", "knows")).unwrap();

        let err = program.add_rule(rule("sym", "likes")).unwrap_err();
        assert!(err.is_program_error());
        assert_eq!(program.version, 1);

        let err = program.remove_rule("missing").unwrap_err();
        assert!(err.is_program_error());
        assert_eq!(program.version, 1);
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let program = Program::new("p")
            .with_rule(rule("r", "knows"))
            .with_rule(rule("r", "likes"));
        assert!(program.validate().is_err());
    }

    #[test]
    fn test_rules_for() {
        let program = Program::new("p")
            .with_rule(rule("sym_knows", "knows"))
            .with_rule(rule("sym_likes", "likes"));
        let triple = Triple::link(
            NodeId::named("a"),
            Predicate::named("knows"),
            NodeId::named("b"),
        );
        let hits = program.rules_for(&triple);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.name, "sym_knows");
        assert_eq!(hits[0].1, 0);
    }

    #[test]
    fn test_json_round_trip() {
        let program = Program::new("p")
            .with_description("demo")
            .with_rule(rule("sym", "knows"));
        let json = program.to_json().unwrap();
        let back = Program::from_json(&json).unwrap();
        assert_eq!(back, program);

        let invalid = Program::new("p")
            .with_rule(rule("r", "a"))
            .with_rule(rule("r", "b"))
            .to_json()
            .unwrap();
        assert!(Program::from_json(&invalid).is_err());
    }
}
