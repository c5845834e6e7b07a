//! Authoring checks for a form definition.
//!
//! These mirror the restrictions the builder applies while a form is
//! edited (section rules may only read fields of earlier sections, choice
//! fields need options, ...). Findings are advisory: the evaluator accepts
//! any form and degrades bad rules to `false`.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use sangha_interchange::{ConditionDef, FieldDef, FieldType, FormDefinition};

use crate::numeric::parse_number;
use crate::types::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A single authoring finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub check: &'static str,
    pub severity: Severity,
    /// Where the problem is, e.g. `section 's2' rule 1`.
    pub location: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub findings: Vec<Finding>,
}

impl CheckReport {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    fn push(&mut self, check: &'static str, severity: Severity, location: String, message: String) {
        self.findings.push(Finding {
            check,
            severity,
            location,
            message,
        });
    }
}

/// Run every authoring check over `form`.
pub fn check_form(form: &FormDefinition) -> CheckReport {
    let mut report = CheckReport::default();

    // field id -> index of the section that owns it (nested included)
    let mut owner: BTreeMap<&str, usize> = BTreeMap::new();
    let mut seen_sections: BTreeSet<&str> = BTreeSet::new();

    for (idx, section) in form.sections.iter().enumerate() {
        if !seen_sections.insert(section.id.as_str()) {
            report.push(
                "duplicate-section",
                Severity::Error,
                format!("section '{}'", section.id),
                format!("section id '{}' is used more than once", section.id),
            );
        }
        for field in &section.fields {
            index_field(field, idx, &mut owner, &mut report);
        }
    }

    for (idx, section) in form.sections.iter().enumerate() {
        for (n, rule) in section.conditional_rules.iter().enumerate() {
            let location = format!("section '{}' rule {}", section.id, n + 1);
            check_rule(rule, &location, &owner, &mut report);
            if let Some(target) = rule.target_text() {
                if let Some(&target_section) = owner.get(target) {
                    if target_section >= idx {
                        report.push(
                            "rule-order",
                            Severity::Warning,
                            location,
                            format!(
                                "target field '{}' is not in an earlier section",
                                target
                            ),
                        );
                    }
                }
            }
        }
        for field in &section.fields {
            check_field(field, &owner, &mut report);
        }
    }

    report
}

fn index_field<'a>(
    field: &'a FieldDef,
    section_idx: usize,
    owner: &mut BTreeMap<&'a str, usize>,
    report: &mut CheckReport,
) {
    if owner.insert(field.id.as_str(), section_idx).is_some() {
        report.push(
            "duplicate-field",
            Severity::Error,
            format!("field '{}'", field.id),
            format!("field id '{}' is used more than once", field.id),
        );
    }
    for nested in &field.nested_fields {
        index_field(nested, section_idx, owner, report);
    }
}

fn check_field(field: &FieldDef, owner: &BTreeMap<&str, usize>, report: &mut CheckReport) {
    let location = format!("field '{}'", field.id);

    if let FieldType::Unknown(raw) = &field.field_type {
        report.push(
            "field-type",
            Severity::Warning,
            location.clone(),
            format!("unknown field type '{}'", raw),
        );
    }
    if field.field_type.takes_options() && field.options.is_empty() {
        report.push(
            "options",
            Severity::Warning,
            location.clone(),
            format!("{} field has no options", field.field_type.as_str()),
        );
    }

    for (n, rule) in field.conditional_rules.iter().enumerate() {
        let rule_location = format!("{} rule {}", location, n + 1);
        check_rule(rule, &rule_location, owner, report);
        if rule.target_text() == Some(field.id.as_str()) {
            report.push(
                "self-reference",
                Severity::Warning,
                rule_location,
                "rule reads the field it controls".to_string(),
            );
        }
    }

    for nested in &field.nested_fields {
        check_field(nested, owner, report);
    }
}

fn check_rule(
    rule: &ConditionDef,
    location: &str,
    owner: &BTreeMap<&str, usize>,
    report: &mut CheckReport,
) {
    match rule.target_text() {
        None | Some("") => report.push(
            "rule-target",
            Severity::Warning,
            location.to_string(),
            "rule has no target field and always evaluates false".to_string(),
        ),
        Some(target) if !owner.contains_key(target) => report.push(
            "rule-target",
            Severity::Warning,
            location.to_string(),
            format!("target field '{}' does not exist in this form", target),
        ),
        Some(_) => {}
    }

    match rule.operator.as_ref().map(|op| (op.to_string(), op.as_str())) {
        None | Some((_, Some(""))) => report.push(
            "rule-operator",
            Severity::Warning,
            location.to_string(),
            "rule has no operator and always evaluates false".to_string(),
        ),
        Some((raw, None)) => report.push(
            "rule-operator",
            Severity::Warning,
            location.to_string(),
            format!("operator {} is not a string; the rule always evaluates false", raw),
        ),
        Some((_, Some(raw))) => match raw.parse::<Operator>() {
            Err(e) => report.push(
                "rule-operator",
                Severity::Warning,
                location.to_string(),
                format!("{}; the rule always evaluates false", e),
            ),
            Ok(op) if op.is_numeric() && parse_number(&rule.value_text()).is_none() => report.push(
                "numeric-literal",
                Severity::Warning,
                location.to_string(),
                format!(
                    "{} needs a numeric value, got '{}'; the rule always evaluates false",
                    op,
                    rule.value_text()
                ),
            ),
            Ok(_) => {}
        },
    }

    if let Some(action) = &rule.action {
        if action.as_str() != Some("show") && action.as_str() != Some("hide") {
            report.push(
                "rule-action",
                Severity::Warning,
                location.to_string(),
                format!("unknown action '{}' is treated as 'show'", action),
            );
        }
    }
}
