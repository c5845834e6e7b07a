//! Typed structs for the form and organization JSON documents.
//!
//! These mirror what the builder and the organization endpoint produce.
//! Rule operators and actions are kept as raw strings here: each consumer
//! decides how to treat values it does not recognize, so a newer builder
//! never breaks deserialization for an older evaluator.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Accept an explicit JSON `null` wherever a list is expected.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_blank<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Form definition ─────────────────────────────────────────────────

/// A complete form: ordered sections, each with ordered fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FormDefinition {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_blank")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_blank")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sections: Vec<SectionDef>,
}

impl FormDefinition {
    /// Iterate every field in the form, nested fields included, depth-first
    /// in authored order.
    pub fn all_fields(&self) -> Vec<&FieldDef> {
        let mut out = Vec::new();
        for section in &self.sections {
            for field in &section.fields {
                field.collect_into(&mut out);
            }
        }
        out
    }

    /// Find a field anywhere in the form by id.
    pub fn find_field(&self, id: &str) -> Option<&FieldDef> {
        self.all_fields().into_iter().find(|f| f.id == id)
    }
}

/// A group of fields with its own visibility rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionDef {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_blank")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_blank")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fields: Vec<FieldDef>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub conditional_rules: Vec<ConditionDef>,
}

/// A single input definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, deserialize_with = "null_as_blank")]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub options: Vec<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub conditional_rules: Vec<ConditionDef>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub nested_fields: Vec<FieldDef>,
}

impl FieldDef {
    fn collect_into<'a>(&'a self, out: &mut Vec<&'a FieldDef>) {
        out.push(self);
        for nested in &self.nested_fields {
            nested.collect_into(out);
        }
    }
}

/// The closed set of field kinds the builder offers.
///
/// `Unknown` keeps whatever string arrived so it can be written back out
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Number,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Date,
    File,
    /// Organization hierarchy picker (khanda / valaya / milan / ghata).
    Sangha,
    WhatsappOptin,
    ArrataiOptin,
    Unknown(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Date => "date",
            FieldType::File => "file",
            FieldType::Sangha => "sangha",
            FieldType::WhatsappOptin => "whatsapp_optin",
            FieldType::ArrataiOptin => "arratai_optin",
            FieldType::Unknown(s) => s,
        }
    }

    /// Whether the builder requires an `options` list for this type.
    pub fn takes_options(&self) -> bool {
        matches!(
            self,
            FieldType::Select | FieldType::Radio | FieldType::Checkbox
        )
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "text" => FieldType::Text,
            "email" => FieldType::Email,
            "number" => FieldType::Number,
            "textarea" => FieldType::Textarea,
            "select" => FieldType::Select,
            "radio" => FieldType::Radio,
            "checkbox" => FieldType::Checkbox,
            "date" => FieldType::Date,
            "file" => FieldType::File,
            "sangha" => FieldType::Sangha,
            "whatsapp_optin" => FieldType::WhatsappOptin,
            "arratai_optin" => FieldType::ArrataiOptin,
            _ => FieldType::Unknown(s),
        }
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.as_str().to_string()
    }
}

/// A conditional rule exactly as authored.
///
/// Every member is optional: a rule saved half-finished by the builder
/// still deserializes, and the evaluator degrades it to `false`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_field: Option<RuleText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<RuleText>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RuleText>,
}

impl ConditionDef {
    pub fn target_text(&self) -> Option<&str> {
        self.target_field.as_ref().and_then(RuleText::as_str)
    }

    pub fn operator_text(&self) -> Option<&str> {
        self.operator.as_ref().and_then(RuleText::as_str)
    }

    pub fn action_text(&self) -> Option<&str> {
        self.action.as_ref().and_then(RuleText::as_str)
    }

    /// The comparison literal as text. Numbers and booleans are rendered
    /// the way they would appear in a text input; anything else is blank.
    pub fn value_text(&self) -> String {
        scalar_text(&self.value).unwrap_or_default()
    }
}

/// A rule member that should be a string. Anything else is kept as raw
/// JSON so one bad rule cannot fail the whole form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RuleText {
    Text(String),
    Other(serde_json::Value),
}

impl RuleText {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RuleText::Text(s) => Some(s),
            RuleText::Other(_) => None,
        }
    }
}

impl std::fmt::Display for RuleText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleText::Text(s) => f.write_str(s),
            RuleText::Other(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for RuleText {
    fn from(s: &str) -> Self {
        RuleText::Text(s.to_string())
    }
}

/// Render a JSON scalar as the string a form input would hold.
pub(crate) fn scalar_text(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ── Value snapshot ──────────────────────────────────────────────────

/// The current value of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    /// Multi-select checkbox result.
    Multi(Vec<String>),
}

impl FieldValue {
    /// True for an empty text value. An empty multi-select is still a
    /// value: membership checks against it are simply false.
    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Multi(_) => None,
        }
    }
}

impl TryFrom<serde_json::Value> for FieldValue {
    type Error = String;

    fn try_from(v: serde_json::Value) -> Result<Self, Self::Error> {
        match v {
            serde_json::Value::Null => Ok(FieldValue::Text(String::new())),
            serde_json::Value::Array(items) => Ok(FieldValue::Multi(
                items.iter().filter_map(scalar_text).collect(),
            )),
            serde_json::Value::Object(_) => {
                Err("field value must be a string or a list of strings".to_string())
            }
            other => Ok(FieldValue::Text(scalar_text(&other).unwrap_or_default())),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        FieldValue::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        FieldValue::Multi(items.into_iter().map(str::to_string).collect())
    }
}

/// Field id to current value, rebuilt by the consumer on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(pub BTreeMap<String, FieldValue>);

impl Snapshot {
    pub fn new() -> Self {
        Snapshot(BTreeMap::new())
    }

    pub fn get(&self, id: &str) -> Option<&FieldValue> {
        self.0.get(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(id.into(), value.into());
    }

    /// Builder-style insert, handy when assembling snapshots inline.
    pub fn with(mut self, id: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(id, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }
}

// ── Organization tree ───────────────────────────────────────────────

/// Root of the organization hierarchy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organization {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_blank")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub khandas: Vec<Khanda>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Khanda {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_blank")]
    pub name: String,
    /// Short stable code, e.g. "DK".
    #[serde(default, deserialize_with = "null_as_blank")]
    pub code: String,
    #[serde(
        default,
        rename = "valays",
        alias = "valayas",
        deserialize_with = "null_as_empty"
    )]
    pub valayas: Vec<Valaya>,
    /// Milans attached straight to the khanda when it has no valayas.
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub milans: Vec<MilanEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Valaya {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_blank")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub milans: Vec<Milan>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Milan {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_blank")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ghatas: Vec<Ghata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ghata {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_blank")]
    pub name: String,
}

/// A milan listed directly under a khanda: either a bare name or a full
/// node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MilanEntry {
    Name(String),
    Node(Milan),
}

impl MilanEntry {
    pub fn name(&self) -> &str {
        match self {
            MilanEntry::Name(n) => n,
            MilanEntry::Node(m) => &m.name,
        }
    }
}

/// Which level of the hierarchy an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Organization,
    Khanda,
    Valaya,
    Milan,
    Ghata,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Organization => "organization",
            Level::Khanda => "khanda",
            Level::Valaya => "valaya",
            Level::Milan => "milan",
            Level::Ghata => "ghata",
        }
    }

    /// The level directly below this one, if any.
    pub fn child(&self) -> Option<Level> {
        match self {
            Level::Organization => Some(Level::Khanda),
            Level::Khanda => Some(Level::Valaya),
            Level::Valaya => Some(Level::Milan),
            Level::Milan => Some(Level::Ghata),
            Level::Ghata => None,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organization" | "org" => Ok(Level::Organization),
            "khanda" => Ok(Level::Khanda),
            "valaya" => Ok(Level::Valaya),
            "milan" => Ok(Level::Milan),
            "ghata" => Ok(Level::Ghata),
            other => Err(format!("unknown hierarchy level '{}'", other)),
        }
    }
}

/// The levels a hierarchy field stores as synthesized sub-ids, in order.
pub const SUB_LEVELS: [Level; 4] = [Level::Khanda, Level::Valaya, Level::Milan, Level::Ghata];

/// Synthesized value key for one level of a hierarchy field, e.g.
/// `region-khanda` for field `region`.
pub fn sub_field_id(field_id: &str, level: Level) -> String {
    format!("{}-{}", field_id, level.as_str())
}
