//! Working representation of forms and rules for the evaluator.
//!
//! These types are DISTINCT from the interchange document types. The
//! interchange layer keeps operators and actions as raw strings; here they
//! are closed enums, and anything that fails to parse is carried as a
//! [`Rule::Malformed`] that always evaluates to `false`.

use std::fmt;
use std::str::FromStr;

use sangha_interchange::{ConditionDef, FieldDef, FieldType, FormDefinition, SectionDef};

pub use sangha_interchange::{FieldValue, Snapshot};

// ──────────────────────────────────────────────
// Operators and actions
// ──────────────────────────────────────────────

/// Comparison applied between a field's current value and a rule literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
        }
    }

    /// Operators that coerce both sides to numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Operator::GreaterThan | Operator::LessThan)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" => Ok(Operator::Equals),
            "not_equals" => Ok(Operator::NotEquals),
            "contains" => Ok(Operator::Contains),
            "greater_than" => Ok(Operator::GreaterThan),
            "less_than" => Ok(Operator::LessThan),
            other => Err(format!("unknown operator '{}'", other)),
        }
    }
}

/// How a true condition affects the owning section or field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Action {
    #[default]
    Show,
    Hide,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Show => "show",
            Action::Hide => "hide",
        }
    }

    /// Parse an authored action. Missing or unrecognized actions fall back
    /// to `Show`, matching how the builder saves a fresh rule.
    pub fn parse_lenient(raw: Option<&str>) -> Action {
        match raw {
            Some("hide") => Action::Hide,
            _ => Action::Show,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────────────────────────
// Rules
// ──────────────────────────────────────────────

/// A well-formed predicate over one field of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub target_field: String,
    pub operator: Operator,
    /// Opaque literal. Never a reference to another field.
    pub value: String,
    pub action: Action,
}

impl Condition {
    pub fn new(
        target_field: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
        action: Action,
    ) -> Self {
        Condition {
            target_field: target_field.into(),
            operator,
            value: value.into(),
            action,
        }
    }

    pub fn show(target_field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Condition::new(target_field, operator, value, Action::Show)
    }

    pub fn hide(target_field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Condition::new(target_field, operator, value, Action::Hide)
    }
}

/// Why an authored rule could not be turned into a [`Condition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRule {
    MissingTarget,
    MissingOperator,
    UnknownOperator(String),
}

impl fmt::Display for MalformedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedRule::MissingTarget => write!(f, "rule has no target field"),
            MalformedRule::MissingOperator => write!(f, "rule has no operator"),
            MalformedRule::UnknownOperator(op) => write!(f, "unknown operator '{}'", op),
        }
    }
}

/// One authored rule as the evaluator sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Valid(Condition),
    /// The condition of a malformed rule is always `false`; its action
    /// still decides how that `false` contributes.
    Malformed { reason: MalformedRule, action: Action },
}

impl Rule {
    pub fn from_interchange(def: &ConditionDef) -> Rule {
        let action = Action::parse_lenient(def.action_text());

        let target_field = match def.target_text() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                return Rule::Malformed {
                    reason: MalformedRule::MissingTarget,
                    action,
                }
            }
        };

        let operator = match &def.operator {
            None => {
                return Rule::Malformed {
                    reason: MalformedRule::MissingOperator,
                    action,
                }
            }
            Some(raw) if raw.as_str() == Some("") => {
                return Rule::Malformed {
                    reason: MalformedRule::MissingOperator,
                    action,
                }
            }
            Some(raw) => match raw.as_str().map(str::parse::<Operator>) {
                Some(Ok(op)) => op,
                _ => {
                    return Rule::Malformed {
                        reason: MalformedRule::UnknownOperator(raw.to_string()),
                        action,
                    }
                }
            },
        };

        Rule::Valid(Condition {
            target_field,
            operator,
            value: def.value_text(),
            action,
        })
    }

    pub fn action(&self) -> Action {
        match self {
            Rule::Valid(c) => c.action,
            Rule::Malformed { action, .. } => *action,
        }
    }

    /// The field id this rule reads, if it names one.
    pub fn target(&self) -> Option<&str> {
        match self {
            Rule::Valid(c) => Some(&c.target_field),
            Rule::Malformed { .. } => None,
        }
    }
}

impl From<Condition> for Rule {
    fn from(c: Condition) -> Self {
        Rule::Valid(c)
    }
}

// ──────────────────────────────────────────────
// Form representation
// ──────────────────────────────────────────────

/// A form converted for evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub rules: Vec<Rule>,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub id: String,
    pub field_type: FieldType,
    pub rules: Vec<Rule>,
    /// Fields owned by this one. Their visibility is computed from their
    /// own rules only.
    pub nested: Vec<Field>,
}

impl Form {
    /// Convert an interchange form. Never fails: bad rules become
    /// [`Rule::Malformed`].
    pub fn from_interchange(def: &FormDefinition) -> Form {
        Form {
            sections: def.sections.iter().map(Section::from_interchange).collect(),
        }
    }

    /// Find a field by id anywhere in the form, nested fields included.
    pub fn find_field(&self, id: &str) -> Option<&Field> {
        self.sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .find_map(|f| f.find(id))
    }
}

impl Section {
    pub fn new(id: impl Into<String>) -> Self {
        Section {
            id: id.into(),
            ..Section::default()
        }
    }

    pub fn with_rule(mut self, rule: impl Into<Rule>) -> Self {
        self.rules.push(rule.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    fn from_interchange(def: &SectionDef) -> Section {
        Section {
            id: def.id.clone(),
            rules: def.conditional_rules.iter().map(Rule::from_interchange).collect(),
            fields: def.fields.iter().map(Field::from_interchange).collect(),
        }
    }
}

impl Field {
    pub fn new(id: impl Into<String>, field_type: FieldType) -> Self {
        Field {
            id: id.into(),
            field_type,
            ..Field::default()
        }
    }

    pub fn with_rule(mut self, rule: impl Into<Rule>) -> Self {
        self.rules.push(rule.into());
        self
    }

    pub fn with_nested(mut self, field: Field) -> Self {
        self.nested.push(field);
        self
    }

    fn from_interchange(def: &FieldDef) -> Field {
        Field {
            id: def.id.clone(),
            field_type: def.field_type.clone(),
            rules: def.conditional_rules.iter().map(Rule::from_interchange).collect(),
            nested: def.nested_fields.iter().map(Field::from_interchange).collect(),
        }
    }

    fn find(&self, id: &str) -> Option<&Field> {
        if self.id == id {
            return Some(self);
        }
        self.nested.iter().find_map(|n| n.find(id))
    }
}
