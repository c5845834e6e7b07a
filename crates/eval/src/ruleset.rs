//! Rule-set evaluation: AND over every rule attached to one section or
//! field.
//!
//! There is no OR and no grouping. Rules are independent, so order does
//! not matter and evaluation stops at the first failing rule.

use crate::condition::evaluate_rule;
use crate::types::{Action, Rule, Snapshot};

/// AND of the raw condition results, ignoring each rule's action.
///
/// An empty rule list passes.
pub fn all_rules_pass(rules: &[Rule], snapshot: &Snapshot) -> bool {
    rules.iter().all(|r| evaluate_rule(r, snapshot))
}

/// What one rule contributes to visibility: a `show` rule contributes its
/// condition result, a `hide` rule the negation.
pub fn rule_contribution(rule: &Rule, snapshot: &Snapshot) -> bool {
    let result = evaluate_rule(rule, snapshot);
    match rule.action() {
        Action::Show => result,
        Action::Hide => !result,
    }
}

/// Whether the rules allow their owner to be shown. An owner with no rules
/// is always shown.
pub fn rules_permit(rules: &[Rule], snapshot: &Snapshot) -> bool {
    rules.iter().all(|r| rule_contribution(r, snapshot))
}
