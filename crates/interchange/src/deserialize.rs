//! Entry points that turn untyped JSON documents into typed structs.
//!
//! Each collaborator endpoint has a couple of historical response shapes;
//! these functions accept all of them and normalize before handing back
//! typed data.

use crate::types::*;
use std::fmt;

/// Errors during JSON deserialization of forms, snapshots, and trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterchangeError {
    /// The document is missing a required top-level field.
    MissingField { field: String },
    /// The document has the wrong overall shape.
    InvalidShape { document: String, message: String },
    /// A nested element failed to deserialize.
    Element {
        document: String,
        path: String,
        message: String,
    },
}

impl fmt::Display for InterchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterchangeError::MissingField { field } => {
                write!(f, "document missing required field: '{}'", field)
            }
            InterchangeError::InvalidShape { document, message } => {
                write!(f, "invalid {}: {}", document, message)
            }
            InterchangeError::Element {
                document,
                path,
                message,
            } => {
                write!(f, "{} {}: {}", document, path, message)
            }
        }
    }
}

impl std::error::Error for InterchangeError {}

/// Deserialize a form definition.
///
/// Accepts either a form object (`{"sections": [...]}`, optionally with
/// `id`, `title`, `description`) or a bare array of sections.
pub fn form_from_json(doc: &serde_json::Value) -> Result<FormDefinition, InterchangeError> {
    match doc {
        serde_json::Value::Array(_) => {
            let sections: Vec<SectionDef> = element(doc, "form", "sections")?;
            Ok(FormDefinition {
                sections,
                ..FormDefinition::default()
            })
        }
        serde_json::Value::Object(obj) => {
            if !obj.contains_key("sections") {
                return Err(InterchangeError::MissingField {
                    field: "sections".to_string(),
                });
            }
            element(doc, "form", "$")
        }
        other => Err(InterchangeError::InvalidShape {
            document: "form".to_string(),
            message: format!("expected object or array, got {}", json_kind(other)),
        }),
    }
}

/// Deserialize a value snapshot (field id to value).
///
/// `null` entries are dropped so they read as absent, which is how the
/// evaluator treats them anyway.
pub fn snapshot_from_json(doc: &serde_json::Value) -> Result<Snapshot, InterchangeError> {
    let obj = doc
        .as_object()
        .ok_or_else(|| InterchangeError::InvalidShape {
            document: "snapshot".to_string(),
            message: format!("expected object, got {}", json_kind(doc)),
        })?;

    let mut snapshot = Snapshot::new();
    for (id, raw) in obj {
        if raw.is_null() {
            continue;
        }
        let value =
            FieldValue::try_from(raw.clone()).map_err(|message| InterchangeError::Element {
                document: "snapshot".to_string(),
                path: id.clone(),
                message,
            })?;
        snapshot.insert(id.clone(), value);
    }
    Ok(snapshot)
}

/// Deserialize the organization tree.
///
/// The organization endpoint answers with either `{"organizations": [...]}`
/// or a bare array; both normalize to a plain vector.
pub fn organizations_from_json(
    doc: &serde_json::Value,
) -> Result<Vec<Organization>, InterchangeError> {
    let list = match doc {
        serde_json::Value::Array(_) => doc,
        serde_json::Value::Object(obj) => match obj.get("organizations") {
            Some(inner @ serde_json::Value::Array(_)) => inner,
            Some(serde_json::Value::Null) => return Ok(Vec::new()),
            Some(other) => {
                return Err(InterchangeError::InvalidShape {
                    document: "organizations".to_string(),
                    message: format!("'organizations' must be an array, got {}", json_kind(other)),
                })
            }
            None => {
                return Err(InterchangeError::MissingField {
                    field: "organizations".to_string(),
                })
            }
        },
        other => {
            return Err(InterchangeError::InvalidShape {
                document: "organizations".to_string(),
                message: format!("expected object or array, got {}", json_kind(other)),
            })
        }
    };
    element(list, "organizations", "$")
}

fn element<T: serde::de::DeserializeOwned>(
    v: &serde_json::Value,
    document: &str,
    path: &str,
) -> Result<T, InterchangeError> {
    T::deserialize(v).map_err(|e| InterchangeError::Element {
        document: document.to_string(),
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_object() {
        let doc = json!({
            "_id": "f1",
            "title": "Registration",
            "sections": [{
                "id": "s1",
                "title": "About you",
                "fields": [{
                    "id": "age",
                    "type": "number",
                    "label": "Age",
                    "required": true
                }]
            }]
        });
        let form = form_from_json(&doc).unwrap();
        assert_eq!(form.id.as_deref(), Some("f1"));
        assert_eq!(form.sections.len(), 1);
        assert_eq!(form.sections[0].fields[0].field_type, FieldType::Number);
        assert!(form.sections[0].fields[0].required);
        assert!(form.sections[0].conditional_rules.is_empty());
    }

    #[test]
    fn test_form_bare_section_array() {
        let doc = json!([{ "id": "s1", "fields": [] }, { "id": "s2", "fields": null }]);
        let form = form_from_json(&doc).unwrap();
        assert_eq!(form.sections.len(), 2);
        assert!(form.sections[1].fields.is_empty());
        assert_eq!(form.title, "");
    }

    #[test]
    fn test_form_missing_sections() {
        let doc = json!({"title": "no sections"});
        match form_from_json(&doc).unwrap_err() {
            InterchangeError::MissingField { field } => assert_eq!(field, "sections"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_form_rejects_scalar() {
        let err = form_from_json(&json!("form")).unwrap_err();
        assert!(matches!(err, InterchangeError::InvalidShape { .. }));
        assert!(err.to_string().contains("got string"));
    }

    #[test]
    fn test_conditional_rules_and_nested_fields() {
        let doc = json!({
            "sections": [{
                "id": "s1",
                "fields": [{
                    "id": "member",
                    "type": "radio",
                    "options": ["yes", "no"],
                    "conditionalRules": [
                        {"targetField": "age", "operator": "greater_than", "value": 18, "action": "show"}
                    ],
                    "nestedFields": [{"id": "since", "type": "date"}]
                }]
            }]
        });
        let form = form_from_json(&doc).unwrap();
        let field = &form.sections[0].fields[0];
        assert_eq!(field.options, vec!["yes", "no"]);
        assert_eq!(field.conditional_rules[0].target_text(), Some("age"));
        assert_eq!(field.conditional_rules[0].value_text(), "18");
        assert_eq!(field.nested_fields[0].id, "since");
        assert_eq!(form.all_fields().len(), 2);
        assert!(form.find_field("since").is_some());
    }

    #[test]
    fn test_half_authored_rule_still_parses() {
        let doc = json!({
            "sections": [{
                "id": "s1",
                "fields": [],
                "conditionalRules": [{"operator": "equals"}]
            }]
        });
        let form = form_from_json(&doc).unwrap();
        let rule = &form.sections[0].conditional_rules[0];
        assert!(rule.target_field.is_none());
        assert!(rule.action.is_none());
        assert_eq!(rule.value_text(), "");
    }

    #[test]
    fn test_non_string_rule_members_still_parse() {
        let doc = json!({
            "sections": [
                {"id": "a", "fields": [{"id": "x"}]},
                {"id": "b", "fields": [], "conditionalRules": [
                    {"targetField": "x", "operator": 5, "action": "show"},
                    {"targetField": ["x"], "operator": "equals", "action": true}
                ]}
            ]
        });
        let form = form_from_json(&doc).unwrap();
        let rules = &form.sections[1].conditional_rules;
        assert_eq!(rules[0].target_text(), Some("x"));
        assert_eq!(rules[0].operator_text(), None);
        assert_eq!(rules[0].operator.as_ref().unwrap().to_string(), "5");
        assert_eq!(rules[1].target_text(), None);
        assert_eq!(rules[1].action_text(), None);
    }

    #[test]
    fn test_unknown_field_type_round_trips() {
        let doc = json!({"sections": [{"id": "s", "fields": [{"id": "x", "type": "signature"}]}]});
        let form = form_from_json(&doc).unwrap();
        let ty = &form.sections[0].fields[0].field_type;
        assert_eq!(ty, &FieldType::Unknown("signature".to_string()));
        let back = serde_json::to_value(ty).unwrap();
        assert_eq!(back, json!("signature"));
    }

    #[test]
    fn test_snapshot_shapes() {
        let doc = json!({
            "name": "Asha",
            "age": 25,
            "agree": true,
            "langs": ["kn", "hi", 3],
            "skipped": null
        });
        let snap = snapshot_from_json(&doc).unwrap();
        assert_eq!(snap.get("name"), Some(&FieldValue::Text("Asha".into())));
        assert_eq!(snap.get("age"), Some(&FieldValue::Text("25".into())));
        assert_eq!(snap.get("agree"), Some(&FieldValue::Text("true".into())));
        assert_eq!(
            snap.get("langs"),
            Some(&FieldValue::Multi(vec!["kn".into(), "hi".into(), "3".into()]))
        );
        assert!(snap.get("skipped").is_none());
    }

    #[test]
    fn test_snapshot_rejects_nested_objects() {
        let err = snapshot_from_json(&json!({"x": {"y": 1}})).unwrap_err();
        match err {
            InterchangeError::Element { path, .. } => assert_eq!(path, "x"),
            other => panic!("expected Element, got {:?}", other),
        }
        assert!(snapshot_from_json(&json!([])).is_err());
    }

    #[test]
    fn test_organizations_wrapped_and_bare() {
        let tree = json!([{
            "_id": "org1",
            "name": "Karnataka",
            "khandas": [{
                "_id": "k1",
                "name": "North",
                "code": "NK",
                "valays": [{
                    "_id": "v1",
                    "name": "Valaya One",
                    "milans": [{"_id": "m1", "name": "Milan One", "ghatas": [{"_id": "g1", "name": "Ghata One"}]}]
                }]
            }]
        }]);
        let bare = organizations_from_json(&tree).unwrap();
        let wrapped = organizations_from_json(&json!({ "organizations": tree })).unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare[0].khandas[0].code, "NK");
        assert_eq!(bare[0].khandas[0].valayas[0].milans[0].ghatas[0].id, "g1");
    }

    #[test]
    fn test_organizations_khanda_with_direct_milans() {
        let tree = json!([{
            "id": "org1",
            "name": "Org",
            "khandas": [{
                "id": "k2",
                "name": "South",
                "code": "SK",
                "valays": [],
                "milans": ["MilanA", {"id": "m9", "name": "MilanB"}]
            }]
        }]);
        let orgs = organizations_from_json(&tree).unwrap();
        let khanda = &orgs[0].khandas[0];
        assert!(khanda.valayas.is_empty());
        assert_eq!(khanda.milans[0], MilanEntry::Name("MilanA".into()));
        assert_eq!(khanda.milans[1].name(), "MilanB");
    }

    #[test]
    fn test_organizations_bad_shapes() {
        assert!(matches!(
            organizations_from_json(&json!({"orgs": []})).unwrap_err(),
            InterchangeError::MissingField { .. }
        ));
        assert!(matches!(
            organizations_from_json(&json!({"organizations": 4})).unwrap_err(),
            InterchangeError::InvalidShape { .. }
        ));
        assert!(organizations_from_json(&json!({"organizations": null}))
            .unwrap()
            .is_empty());
        assert!(organizations_from_json(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_sub_field_id() {
        assert_eq!(sub_field_id("region", Level::Milan), "region-milan");
        assert_eq!("ghata".parse::<Level>().unwrap(), Level::Ghata);
        assert!("zone".parse::<Level>().is_err());
    }
}
