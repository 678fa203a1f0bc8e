//! Filter predicates evaluated against stored records.
//!
//! A `Predicate` is the typed counterpart of a key-value store filter expression
//! (`#status = :status AND contains(#email, :term)`). The store evaluates it on every
//! record a scan or query reads, after the page limit is applied.

use crate::timestamps;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(String, Value),
    /// Inclusive on both ends.
    Between(String, Value, Value),
    Gte(String, Value),
    Lte(String, Value),
    /// Substring match on string attributes, membership on list attributes.
    Contains(String, Value),
    Exists(String),
    NotExists(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(attribute: &str, value: impl Into<Value>) -> Self {
        Self::Eq(attribute.to_string(), value.into())
    }

    /// Conjunction of `parts`, or `None` when there is nothing to filter on.
    pub fn all(mut parts: Vec<Predicate>) -> Option<Self> {
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Self::And(parts)),
        }
    }

    pub fn matches(&self, item: &Value) -> bool {
        match self {
            Self::Eq(attribute, expected) => {
                attr(item, attribute).is_some_and(|actual| compare(actual, expected) == Some(Ordering::Equal))
            }
            Self::Between(attribute, low, high) => attr(item, attribute).is_some_and(|actual| {
                matches!(compare(actual, low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(actual, high), Some(Ordering::Less | Ordering::Equal))
            }),
            Self::Gte(attribute, low) => attr(item, attribute).is_some_and(|actual| {
                matches!(compare(actual, low), Some(Ordering::Greater | Ordering::Equal))
            }),
            Self::Lte(attribute, high) => attr(item, attribute).is_some_and(|actual| {
                matches!(compare(actual, high), Some(Ordering::Less | Ordering::Equal))
            }),
            Self::Contains(attribute, needle) => match (attr(item, attribute), needle) {
                (Some(Value::String(haystack)), Value::String(needle)) => haystack.contains(needle.as_str()),
                (Some(Value::Array(elements)), needle) => elements.iter().any(|e| e == needle),
                _ => false,
            },
            Self::Exists(attribute) => attr(item, attribute).is_some(),
            Self::NotExists(attribute) => attr(item, attribute).is_none(),
            Self::And(parts) => parts.iter().all(|p| p.matches(item)),
            Self::Or(parts) => parts.iter().any(|p| p.matches(item)),
        }
    }
}

/// Missing and `null` attributes are the same thing to the store.
fn attr<'a>(item: &'a Value, attribute: &str) -> Option<&'a Value> {
    item.get(attribute).filter(|v| !v.is_null())
}

/// Numbers compare numerically, RFC 3339 strings chronologically, other strings
/// lexicographically. Values of different kinds are incomparable.
fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => match (timestamps::parse(a), timestamps::parse(b)) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => Some(a.as_str().cmp(b.as_str())),
        },
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Renders the predicate in key-value store expression syntax, for logs.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq(a, v) => write!(f, "{a} = {v}"),
            Self::Between(a, low, high) => write!(f, "{a} BETWEEN {low} AND {high}"),
            Self::Gte(a, v) => write!(f, "{a} >= {v}"),
            Self::Lte(a, v) => write!(f, "{a} <= {v}"),
            Self::Contains(a, v) => write!(f, "contains({a}, {v})"),
            Self::Exists(a) => write!(f, "attribute_exists({a})"),
            Self::NotExists(a) => write!(f, "attribute_not_exists({a})"),
            Self::And(parts) => join(f, parts, " AND "),
            Self::Or(parts) => join(f, parts, " OR "),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, parts: &[Predicate], separator: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{part}")?;
    }
    f.write_str(")")
}
