//! Rule dependency map: which sections and fields read which field.
//!
//! Consumers use this to know whose visibility a value change can affect.
//! It is observational only; [`crate::visibility::resolve`] always
//! recomputes everything.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{Field, Form, Rule};

/// The owner of a rule list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleOwner {
    Section(String),
    Field(String),
}

/// Target field id -> owners whose rules read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap(pub BTreeMap<String, BTreeSet<RuleOwner>>);

impl DependencyMap {
    pub fn build(form: &Form) -> Self {
        let mut map = DependencyMap::default();
        for section in &form.sections {
            map.add_rules(&section.rules, RuleOwner::Section(section.id.clone()));
            for field in &section.fields {
                map.add_field(field);
            }
        }
        map
    }

    fn add_field(&mut self, field: &Field) {
        self.add_rules(&field.rules, RuleOwner::Field(field.id.clone()));
        for nested in &field.nested {
            self.add_field(nested);
        }
    }

    fn add_rules(&mut self, rules: &[Rule], owner: RuleOwner) {
        for target in rules.iter().filter_map(Rule::target) {
            self.0
                .entry(target.to_string())
                .or_default()
                .insert(owner.clone());
        }
    }

    /// Owners whose visibility may change when `field_id` changes.
    pub fn dependents(&self, field_id: &str) -> Option<&BTreeSet<RuleOwner>> {
        self.0.get(field_id)
    }

    /// Field ids read by at least one rule.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
