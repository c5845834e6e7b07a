//! Submission filtering.
//!
//! Only values of visible fields may be stored with a response. Hierarchy
//! fields store one synthesized sub-id per level (`<id>-khanda`,
//! `<id>-valaya`, ...), which follow the visibility of their field.

use std::collections::BTreeSet;

use sangha_interchange::{sub_field_id, FieldType, SUB_LEVELS};

use crate::types::{Field, Form, Snapshot};
use crate::visibility::{resolve, VisibilityResult};

/// Every value key a submission may carry for this visibility result.
pub fn allowed_keys(form: &Form, visibility: &VisibilityResult) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for section in &form.sections {
        if !visibility.is_section_visible(&section.id) {
            continue;
        }
        for field in &section.fields {
            collect_keys(field, visibility, &mut keys);
        }
    }
    keys
}

fn collect_keys(field: &Field, visibility: &VisibilityResult, keys: &mut BTreeSet<String>) {
    if visibility.is_field_visible(&field.id) {
        keys.insert(field.id.clone());
        if field.field_type == FieldType::Sangha {
            for level in SUB_LEVELS {
                keys.insert(sub_field_id(&field.id, level));
            }
        }
    }
    for nested in &field.nested {
        collect_keys(nested, visibility, keys);
    }
}

/// Drop every value whose key is not eligible under `visibility`.
pub fn filter_submission(
    form: &Form,
    visibility: &VisibilityResult,
    values: &Snapshot,
) -> Snapshot {
    let keys = allowed_keys(form, visibility);
    let mut kept = Snapshot::new();
    for (id, value) in values.iter() {
        if keys.contains(id) {
            kept.insert(id.clone(), value.clone());
        } else {
            tracing::debug!(field = %id, "dropping value of hidden or unknown field");
        }
    }
    kept
}

/// Resolve visibility for `values` and filter them in one step.
pub fn prepare_submission(form: &Form, values: &Snapshot) -> Snapshot {
    let visibility = resolve(form, values);
    filter_submission(form, &visibility, values)
}
