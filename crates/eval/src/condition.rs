//! Leaf condition evaluator.
//!
//! Compares one field's current value against a rule literal. Pure: the
//! snapshot is only read, and nothing here can fail. Malformed input
//! evaluates to `false`.

use std::cmp::Ordering;

use crate::numeric::compare_numeric;
use crate::types::{Condition, FieldValue, Operator, Rule, Snapshot};

/// Evaluate a single condition against the snapshot.
///
/// The rule's `action` is ignored here; callers decide what a true
/// condition means for visibility.
pub fn evaluate(condition: &Condition, snapshot: &Snapshot) -> bool {
    match snapshot.get(&condition.target_field) {
        None => eval_missing(condition),
        Some(v) if v.is_blank() => eval_missing(condition),
        Some(FieldValue::Text(text)) => eval_scalar(condition, text),
        Some(FieldValue::Multi(items)) => eval_multi(condition, items),
    }
}

/// Evaluate the condition part of an authored rule. A malformed rule's
/// condition is always `false`.
pub fn evaluate_rule(rule: &Rule, snapshot: &Snapshot) -> bool {
    match rule {
        Rule::Valid(c) => evaluate(c, snapshot),
        Rule::Malformed { reason, .. } => {
            tracing::debug!(%reason, "malformed rule evaluates to false");
            false
        }
    }
}

/// Absent, null and empty-string targets.
///
/// Every operator short-circuits to `false` except `not_equals`, which
/// compares the empty string against the literal.
fn eval_missing(condition: &Condition) -> bool {
    match condition.operator {
        Operator::NotEquals => !condition.value.is_empty(),
        Operator::Equals | Operator::Contains | Operator::GreaterThan | Operator::LessThan => false,
    }
}

fn eval_scalar(condition: &Condition, text: &str) -> bool {
    let target = text.to_lowercase();
    let literal = condition.value.to_lowercase();
    match condition.operator {
        Operator::Equals => target == literal,
        Operator::NotEquals => target != literal,
        Operator::Contains => target.contains(&literal),
        Operator::GreaterThan => compare_numeric(text, &condition.value) == Some(Ordering::Greater),
        Operator::LessThan => compare_numeric(text, &condition.value) == Some(Ordering::Less),
    }
}

/// Multi-select values compare by membership of the literal.
fn eval_multi(condition: &Condition, items: &[String]) -> bool {
    let member = items.iter().any(|i| *i == condition.value);
    match condition.operator {
        Operator::Equals | Operator::Contains => member,
        Operator::NotEquals => !member,
        Operator::GreaterThan | Operator::LessThan => false,
    }
}
