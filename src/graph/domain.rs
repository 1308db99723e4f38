//! Stop/exclude domains: `[field, operator, value]` terms ANDed together.
//!
//! The traversal engine only hands domains to a [`RelationResolver`]; it is
//! the resolver that decides what a field means for its records. Terms are
//! parsed lazily so a malformed domain surfaces as an evaluation error that
//! the policy can log and treat as a non-match.
//!
//! [`RelationResolver`]: crate::graph::RelationResolver

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ModgraphError, Result};

/// Comparison operator of a single domain term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    In,
    NotIn,
    Like,
    ILike,
    EqLike,
    EqILike,
}

impl Operator {
    pub fn parse(op: &str) -> Result<Self> {
        match op {
            "=" | "==" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::NotEq),
            "in" => Ok(Operator::In),
            "not in" => Ok(Operator::NotIn),
            "like" => Ok(Operator::Like),
            "ilike" => Ok(Operator::ILike),
            "=like" => Ok(Operator::EqLike),
            "=ilike" => Ok(Operator::EqILike),
            other => Err(ModgraphError::Predicate(format!("unsupported operator '{}'", other))),
        }
    }
}

/// One parsed `[field, operator, value]` term.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

/// Something a domain can be evaluated against.
pub trait DomainRecord {
    /// Value of `field`, `Value::Null` when the field exists but is unset.
    /// Unknown fields are an error.
    fn field_value(&self, field: &str) -> Result<Value>;
}

/// A conjunction of domain terms, kept in its raw JSON form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(Vec<Value>);

impl Domain {
    pub fn new(terms: Vec<Value>) -> Self {
        Self(terms)
    }

    /// Accepts a JSON array, anything else is not a domain.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_array().map(|terms| Self(terms.clone()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn terms(&self) -> Result<Vec<Term>> {
        self.0.iter().map(parse_term).collect()
    }

    /// True when every term holds for `record`. An empty domain matches all.
    pub fn evaluate(&self, record: &impl DomainRecord) -> Result<bool> {
        for term in self.terms()? {
            let actual = record.field_value(&term.field)?;
            if !term_holds(&term, &actual)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Array(self.0.clone()))
    }
}

fn parse_term(raw: &Value) -> Result<Term> {
    let parts = raw
        .as_array()
        .filter(|parts| parts.len() == 3)
        .ok_or_else(|| ModgraphError::Predicate(format!("term {} is not [field, operator, value]", raw)))?;

    let field = parts[0]
        .as_str()
        .ok_or_else(|| ModgraphError::Predicate(format!("field name must be a string in {}", raw)))?;
    let operator = parts[1]
        .as_str()
        .ok_or_else(|| ModgraphError::Predicate(format!("operator must be a string in {}", raw)))
        .and_then(Operator::parse)?;

    Ok(Term {
        field: field.to_string(),
        operator,
        value: parts[2].clone(),
    })
}

fn term_holds(term: &Term, actual: &Value) -> Result<bool> {
    match term.operator {
        Operator::Eq => Ok(loosely_equal(actual, &term.value)),
        Operator::NotEq => Ok(!loosely_equal(actual, &term.value)),
        Operator::In | Operator::NotIn => {
            let candidates = term.value.as_array().ok_or_else(|| {
                ModgraphError::Predicate(format!("'{}' expects a list value", term.field))
            })?;
            let found = candidates.iter().any(|c| loosely_equal(actual, c));
            Ok(if term.operator == Operator::In { found } else { !found })
        }
        Operator::Like | Operator::ILike => {
            let needle = pattern_value(term)?;
            let Some(haystack) = actual.as_str() else {
                return Ok(false);
            };
            if term.operator == Operator::Like {
                Ok(haystack.contains(needle))
            } else {
                Ok(haystack.to_lowercase().contains(&needle.to_lowercase()))
            }
        }
        Operator::EqLike | Operator::EqILike => {
            let pattern = pattern_value(term)?;
            let Some(haystack) = actual.as_str() else {
                return Ok(false);
            };
            let regex = like_to_regex(pattern, term.operator == Operator::EqILike)?;
            Ok(regex.is_match(haystack))
        }
    }
}

fn pattern_value(term: &Term) -> Result<&str> {
    term.value.as_str().ok_or_else(|| {
        ModgraphError::Predicate(format!("'{}' pattern must be a string", term.field))
    })
}

/// `false` stands for "unset" the way the host store encodes empty relations.
fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Bool(false)) => true,
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == expected,
    }
}

/// SQL-style `%`/`_` wildcards, anchored at both ends.
fn like_to_regex(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    let mut expr = String::from(if case_insensitive { "(?i)^" } else { "^" });
    for ch in pattern.chars() {
        match ch {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr).map_err(|e| ModgraphError::Predicate(format!("bad pattern '{}': {}", pattern, e)))
}
