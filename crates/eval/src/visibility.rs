//! Visibility resolver.
//!
//! Runs rule evaluation over every section and field of a form and returns
//! the full visible set for one snapshot. The result is recomputed from
//! scratch on every call; there is no cache to go stale.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::ruleset::rules_permit;
use crate::types::{Field, Form, Section, Snapshot};

/// Ids of every visible section and field (nested fields included).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityResult {
    pub visible_section_ids: BTreeSet<String>,
    pub visible_field_ids: BTreeSet<String>,
}

impl VisibilityResult {
    pub fn is_section_visible(&self, id: &str) -> bool {
        self.visible_section_ids.contains(id)
    }

    pub fn is_field_visible(&self, id: &str) -> bool {
        self.visible_field_ids.contains(id)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Compute the visible sections and fields of `form` for `snapshot`.
///
/// 1. A section is visible when its rules permit it (no rules: visible).
/// 2. A hidden section contributes none of its fields.
/// 3. Each field of a visible section is visible when its own rules permit.
/// 4. Nested fields are judged on their own rules only, whether or not the
///    owning field is visible.
pub fn resolve(form: &Form, snapshot: &Snapshot) -> VisibilityResult {
    let mut result = VisibilityResult::default();

    for section in &form.sections {
        if !section_visible(section, snapshot) {
            tracing::trace!(section = %section.id, "section hidden");
            continue;
        }
        result.visible_section_ids.insert(section.id.clone());
        for field in &section.fields {
            collect_field(field, snapshot, &mut result.visible_field_ids);
        }
    }

    tracing::trace!(
        sections = result.visible_section_ids.len(),
        fields = result.visible_field_ids.len(),
        "visibility resolved"
    );
    result
}

fn section_visible(section: &Section, snapshot: &Snapshot) -> bool {
    rules_permit(&section.rules, snapshot)
}

fn collect_field(field: &Field, snapshot: &Snapshot, out: &mut BTreeSet<String>) {
    if rules_permit(&field.rules, snapshot) {
        out.insert(field.id.clone());
    }
    for nested in &field.nested {
        collect_field(nested, snapshot, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, Condition, MalformedRule, Operator, Rule};
    use sangha_interchange::FieldType;

    fn text(id: &str) -> Field {
        Field::new(id, FieldType::Text)
    }

    #[test]
    fn no_rules_everything_visible() {
        let form = Form {
            sections: vec![
                Section::new("s1").with_field(text("a")).with_field(text("b")),
                Section::new("s2").with_field(text("c").with_nested(text("c1"))),
            ],
        };
        let result = resolve(&form, &Snapshot::new());
        assert_eq!(result.visible_section_ids.len(), 2);
        for id in ["a", "b", "c", "c1"] {
            assert!(result.is_field_visible(id), "{} should be visible", id);
        }
    }

    #[test]
    fn hidden_section_hides_its_fields() {
        let form = Form {
            sections: vec![
                Section::new("s1").with_field(text("member")),
                Section::new("s2")
                    .with_rule(Condition::show("member", Operator::Equals, "yes"))
                    .with_field(text("since").with_nested(text("details"))),
            ],
        };
        let result = resolve(&form, &Snapshot::new().with("member", "no"));
        assert!(result.is_section_visible("s1"));
        assert!(!result.is_section_visible("s2"));
        assert!(!result.is_field_visible("since"));
        assert!(!result.is_field_visible("details"));

        let result = resolve(&form, &Snapshot::new().with("member", "Yes"));
        assert!(result.is_section_visible("s2"));
        assert!(result.is_field_visible("since"));
    }

    #[test]
    fn show_and_hide_actions() {
        let build = |action| Form {
            sections: vec![Section::new("s").with_rule(Condition::new(
                "field",
                Operator::Equals,
                "x",
                action,
            ))],
        };
        let s = Snapshot::new().with("field", "x");
        assert!(!resolve(&build(Action::Hide), &s).is_section_visible("s"));
        assert!(resolve(&build(Action::Show), &s).is_section_visible("s"));
    }

    #[test]
    fn field_rules_gate_fields() {
        let form = Form {
            sections: vec![Section::new("s")
                .with_field(text("age"))
                .with_field(text("guardian").with_rule(Condition::show(
                    "age",
                    Operator::LessThan,
                    "18",
                )))],
        };
        assert!(resolve(&form, &Snapshot::new().with("age", "12")).is_field_visible("guardian"));
        assert!(!resolve(&form, &Snapshot::new().with("age", "40")).is_field_visible("guardian"));
        assert!(!resolve(&form, &Snapshot::new()).is_field_visible("guardian"));
    }

    #[test]
    fn nested_field_independent_of_parent() {
        let parent = text("parent")
            .with_rule(Condition::show("trigger", Operator::Equals, "on"))
            .with_nested(text("child"));
        let form = Form {
            sections: vec![Section::new("s").with_field(parent)],
        };
        let result = resolve(&form, &Snapshot::new());
        assert!(!result.is_field_visible("parent"));
        assert!(result.is_field_visible("child"));
    }

    #[test]
    fn nested_field_rules_use_full_snapshot() {
        let parent = text("parent").with_nested(
            text("child").with_rule(Condition::show("elsewhere", Operator::Contains, "go")),
        );
        let form = Form {
            sections: vec![
                Section::new("s1").with_field(parent),
                Section::new("s2").with_field(text("elsewhere")),
            ],
        };
        assert!(resolve(&form, &Snapshot::new().with("elsewhere", "Let's GO")).is_field_visible("child"));
        assert!(!resolve(&form, &Snapshot::new()).is_field_visible("child"));
    }

    #[test]
    fn section_rule_may_target_field_in_hidden_section() {
        let form = Form {
            sections: vec![
                Section::new("gate")
                    .with_rule(Condition::show("never", Operator::Equals, "x"))
                    .with_field(text("inner")),
                Section::new("follow").with_rule(Condition::show("inner", Operator::Equals, "v")),
            ],
        };
        let result = resolve(&form, &Snapshot::new().with("inner", "v"));
        assert!(!result.is_section_visible("gate"));
        assert!(result.is_section_visible("follow"));
    }

    #[test]
    fn malformed_rule_hides_owner() {
        let form = Form {
            sections: vec![Section::new("s").with_rule(Rule::Malformed {
                reason: MalformedRule::UnknownOperator("starts_with".into()),
                action: Action::Show,
            })],
        };
        let result = resolve(&form, &Snapshot::new().with("x", "y"));
        assert!(result.visible_section_ids.is_empty());
    }

    #[test]
    fn resolve_is_repeatable() {
        let form = Form {
            sections: vec![Section::new("s")
                .with_field(text("a").with_rule(Condition::show("b", Operator::NotEquals, "z")))],
        };
        let s = Snapshot::new().with("b", "q");
        assert_eq!(resolve(&form, &s), resolve(&form, &s));
    }

    #[test]
    fn json_shape() {
        let form = Form {
            sections: vec![Section::new("s").with_field(text("a"))],
        };
        let json = resolve(&form, &Snapshot::new()).to_json();
        assert_eq!(
            json,
            serde_json::json!({"visibleSectionIds": ["s"], "visibleFieldIds": ["a"]})
        );
    }
}
