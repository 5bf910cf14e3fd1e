//! Built-in rules for common inference patterns
//!
//! Property characteristics (transitive, symmetric, inverse) and the RDFS
//! entailment rules for sub-properties, sub-classes, domains and ranges.

use aingle_triples::Predicate;

use crate::program::Program;
use crate::rule::{Pattern, Rule, TriplePattern};

/// Constructors for commonly used rules and programs.
pub struct BuiltinRules;

fn pattern(s: &str, p: Pattern, o: &str) -> TriplePattern {
    TriplePattern::new(Pattern::var(s), p, Pattern::var(o))
}

fn iri(predicate: Predicate) -> Pattern {
    Pattern::node(predicate.as_str())
}

impl BuiltinRules {
    /// `(x p y), (y p z) -> (x p z)`
    pub fn transitive(name: impl Into<String>, predicate: &str) -> Rule {
        let p = || Pattern::node(predicate);
        Rule::builder(name)
            .description(format!("{} is transitive", predicate))
            .when(pattern("x", p(), "y"))
            .when(pattern("y", p(), "z"))
            .then(pattern("x", p(), "z"))
            .build()
    }

    /// `(x p y) -> (y p x)`
    pub fn symmetric(name: impl Into<String>, predicate: &str) -> Rule {
        let p = || Pattern::node(predicate);
        Rule::builder(name)
            .description(format!("{} is symmetric", predicate))
            .when(pattern("x", p(), "y"))
            .then(pattern("y", p(), "x"))
            .build()
    }

    /// `(x p y) -> (y q x)`
    pub fn inverse(name: impl Into<String>, predicate: &str, inverse: &str) -> Rule {
        Rule::builder(name)
            .description(format!("{} is the inverse of {}", inverse, predicate))
            .when(pattern("x", Pattern::node(predicate), "y"))
            .then(pattern("y", Pattern::node(inverse), "x"))
            .build()
    }

    /// rdfs7: `(p rdfs:subPropertyOf q), (x p y) -> (x q y)`
    pub fn sub_property() -> Rule {
        Rule::builder("rdfs7")
            .description("Statements hold for every super-property")
            .when(pattern("p", iri(Predicate::rdfs_subproperty_of()), "q"))
            .when(pattern("x", Pattern::var("p"), "y"))
            .then(pattern("x", Pattern::var("q"), "y"))
            .build()
    }

    /// rdfs9: `(c rdfs:subClassOf d), (x rdf:type c) -> (x rdf:type d)`
    pub fn sub_class() -> Rule {
        Rule::builder("rdfs9")
            .description("Instances of a class are instances of its super-classes")
            .when(pattern("c", iri(Predicate::rdfs_subclass_of()), "d"))
            .when(pattern("x", iri(Predicate::rdf_type()), "c"))
            .then(pattern("x", iri(Predicate::rdf_type()), "d"))
            .build()
    }

    /// rdfs2: `(p rdfs:domain c), (x p y) -> (x rdf:type c)`
    pub fn domain() -> Rule {
        Rule::builder("rdfs2")
            .description("Subjects of a property belong to its domain")
            .when(pattern("p", iri(Predicate::rdfs_domain()), "c"))
            .when(pattern("x", Pattern::var("p"), "y"))
            .then(pattern("x", iri(Predicate::rdf_type()), "c"))
            .build()
    }

    /// rdfs3: `(p rdfs:range c), (x p y) -> (y rdf:type c)`
    ///
    /// Literal objects bind `y` to a value that cannot be a subject, so the
    /// head is skipped for them.
    pub fn range() -> Rule {
        Rule::builder("rdfs3")
            .description("Objects of a property belong to its range")
            .when(pattern("p", iri(Predicate::rdfs_range()), "c"))
            .when(pattern("x", Pattern::var("p"), "y"))
            .then(pattern("y", iri(Predicate::rdf_type()), "c"))
            .build()
    }

    /// rdfs5 and rdfs11: transitivity of sub-property and sub-class.
    pub fn hierarchy() -> Vec<Rule> {
        vec![
            Self::transitive("rdfs5", Predicate::rdfs_subproperty_of().as_str()),
            Self::transitive("rdfs11", Predicate::rdfs_subclass_of().as_str()),
        ]
    }

    /// The RDFS subset above as one program.
    pub fn rdfs() -> Program {
        let mut program = Program::new("rdfs").with_description("RDFS entailment subset");
        for rule in [
            Self::sub_property(),
            Self::sub_class(),
            Self::domain(),
            Self::range(),
        ]
        .into_iter()
        .chain(Self::hierarchy())
        {
            program = program.with_rule(rule);
        }
        program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_validate() {
        assert!(BuiltinRules::transitive("t", "ancestor").validate().is_ok());
        assert!(BuiltinRules::symmetric("s", "knows").validate().is_ok());
        assert!(BuiltinRules::inverse("i", "parent", "child").validate().is_ok());
        assert!(BuiltinRules::rdfs().validate().is_ok());
    }

    #[test]
    fn test_rdfs_program() {
        let program = BuiltinRules::rdfs();
        assert_eq!(program.len(), 6);
        assert_eq!(
            program.rule_names(),
            vec!["rdfs7", "rdfs9", "rdfs2", "rdfs3", "rdfs5", "rdfs11"]
        );
    }

    #[test]
    fn test_transitive_shape() {
        let rule = BuiltinRules::transitive("t", "ancestor");
        assert_eq!(rule.body.len(), 2);
        assert_eq!(rule.head.len(), 1);
        assert_eq!(rule.body_variables(), vec!["x", "y", "z"]);
    }
}
