//! Store-agnostic boolean predicates

use crate::core::field::FieldValue;
use crate::core::query::SortKey;
use crate::core::record::Record;
use std::cmp::Ordering;

/// Comparison operator of a [`Predicate::Compare`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gte,
    Lte,
}

/// A boolean tree over record fields
///
/// Deliberately small: callers can only produce conjunctions of field tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every record
    Always,

    /// Matches no record
    Never,

    /// `field <op> value`
    Compare {
        field: String,
        op: CompareOp,
        value: FieldValue,
    },

    /// `field` equals one of `values`
    In {
        field: String,
        values: Vec<FieldValue>,
    },

    /// All children match
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op: CompareOp::Eq,
            value: value.into(),
        }
    }

    pub fn gte(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op: CompareOp::Gte,
            value: value.into(),
        }
    }

    pub fn lte(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op: CompareOp::Lte,
            value: value.into(),
        }
    }

    /// Membership test; an empty set is [`Predicate::Never`]
    pub fn one_of(field: impl Into<String>, values: Vec<FieldValue>) -> Self {
        if values.is_empty() {
            Predicate::Never
        } else {
            Predicate::In {
                field: field.into(),
                values,
            }
        }
    }

    /// Conjoin predicates, flattening nested `And`s
    ///
    /// `Always` children vanish, any `Never` child makes the whole conjunction
    /// `Never`, and a single remaining child is returned as-is.
    pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let mut children = Vec::new();

        for predicate in predicates {
            match predicate {
                Predicate::Always => {}
                Predicate::Never => return Predicate::Never,
                Predicate::And(nested) => match Predicate::and(nested) {
                    Predicate::Always => {}
                    Predicate::Never => return Predicate::Never,
                    Predicate::And(flat) => children.extend(flat),
                    other => children.push(other),
                },
                other => children.push(other),
            }
        }

        match children.len() {
            0 => Predicate::Always,
            1 => children.remove(0),
            _ => Predicate::And(children),
        }
    }

    /// Whether the predicate can never match
    pub fn is_never(&self) -> bool {
        matches!(self, Predicate::Never)
    }

    /// Evaluate against a record
    ///
    /// Missing fields never satisfy a comparison, and incomparable values
    /// (a string against a number) never match.
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Never => false,
            Predicate::Compare { field, op, value } => match record.field_value(field) {
                Some(actual) => compare_matches(&actual, *op, value),
                None => false,
            },
            Predicate::In { field, values } => match record.field_value(field) {
                Some(actual) => values.iter().any(|v| actual.matches(v)),
                None => false,
            },
            Predicate::And(children) => children.iter().all(|p| p.matches(record)),
        }
    }
}

fn compare_matches(actual: &FieldValue, op: CompareOp, expected: &FieldValue) -> bool {
    match (op, actual.compare(expected)) {
        (_, None) => false,
        (CompareOp::Eq, Some(ordering)) => ordering == Ordering::Equal,
        (CompareOp::Gte, Some(ordering)) => ordering != Ordering::Less,
        (CompareOp::Lte, Some(ordering)) => ordering != Ordering::Greater,
    }
}

/// A validated filter and sort for one entity
///
/// Carries no tenant; the repository adds the scope before anything reaches a
/// store.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    pub predicate: Predicate,
    pub sort: Vec<SortKey>,
}
