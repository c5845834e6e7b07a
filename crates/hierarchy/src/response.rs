//! Turning a stored response into rows a reviewer can read.

use serde::Serialize;

use sangha_interchange::{FieldType, FieldValue, FormDefinition, Snapshot};

use crate::index::{HierarchyIndex, Selection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    pub field_id: String,
    pub label: String,
    pub value: String,
}

/// Multi-values join with `", "`.
pub fn display_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) => s.clone(),
        FieldValue::Multi(items) => items.join(", "),
    }
}

/// One row per answered field, in form order (nested fields included).
///
/// Sangha fields show their resolved path; ids the index does not know
/// show as the raw id. Fields with no stored value are left out.
pub fn display_response(
    form: &FormDefinition,
    response: &Snapshot,
    index: &HierarchyIndex,
) -> Vec<DisplayRow> {
    form.all_fields()
        .into_iter()
        .filter_map(|field| {
            let value = if field.field_type == FieldType::Sangha {
                let selection = Selection::from_snapshot(&field.id, response);
                if selection.is_empty() {
                    return None;
                }
                index.resolve_path(&selection)
            } else {
                let value = response.get(&field.id)?;
                if value.is_blank() {
                    return None;
                }
                display_value(value)
            };
            let label = if field.label.trim().is_empty() {
                field.id.clone()
            } else {
                field.label.clone()
            };
            Some(DisplayRow {
                field_id: field.id.clone(),
                label,
                value,
            })
        })
        .collect()
}
