//! sangha form rule evaluator -- accepts a form definition plus a value
//! snapshot and produces the set of visible sections and fields.
//!
//! Evaluation never fails. A rule that cannot be understood (no target,
//! unknown operator) evaluates to `false`; only malformed JSON at the
//! document boundary is reported as an error.

pub mod check;
pub mod condition;
pub mod dependency;
pub mod numeric;
pub mod ruleset;
pub mod submission;
pub mod types;
pub mod visibility;

pub use check::{check_form, CheckReport, Finding, Severity};
pub use condition::{evaluate as evaluate_condition, evaluate_rule};
pub use dependency::{DependencyMap, RuleOwner};
pub use ruleset::{all_rules_pass, rule_contribution, rules_permit};
pub use submission::{filter_submission, prepare_submission};
pub use types::{
    Action, Condition, Field, FieldValue, Form, MalformedRule, Operator, Rule, Section, Snapshot,
};
pub use visibility::{resolve, VisibilityResult};

use sangha_interchange::InterchangeError;

/// Resolve visibility straight from JSON documents.
///
/// # Arguments
/// * `form` - form definition JSON (object with `sections`, or a bare section array)
/// * `values` - snapshot JSON object mapping field ids to values
pub fn evaluate(
    form: &serde_json::Value,
    values: &serde_json::Value,
) -> Result<VisibilityResult, InterchangeError> {
    let form = Form::from_interchange(&sangha_interchange::form_from_json(form)?);
    let snapshot = sangha_interchange::snapshot_from_json(values)?;
    Ok(resolve(&form, &snapshot))
}

/// Filter a submitted value snapshot down to visible fields, straight from
/// JSON documents.
pub fn submission(
    form: &serde_json::Value,
    values: &serde_json::Value,
) -> Result<Snapshot, InterchangeError> {
    let form = Form::from_interchange(&sangha_interchange::form_from_json(form)?);
    let snapshot = sangha_interchange::snapshot_from_json(values)?;
    Ok(prepare_submission(&form, &snapshot))
}
