//! Visibility conformance suite.
//!
//! Each case is a fixture triplet under `conformance/visibility/`:
//! - `<form>.form.json`        -- form definition
//! - `<case>.values.json`      -- value snapshot
//! - `<case>.expected.json`    -- expected visible section and field ids
//!
//! A case name is `<form>_<scenario>`; several scenarios share one form.

use std::path::{Path, PathBuf};

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../conformance/visibility")
        .to_path_buf()
}

fn read_json(path: &Path) -> serde_json::Value {
    let s = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&s).unwrap_or_else(|e| panic!("Invalid JSON in {}: {}", path.display(), e))
}

/// Evaluate `<form>.form.json` against `<case>.values.json` and compare with
/// `<case>.expected.json`.
fn run_visibility_fixture(form: &str, case: &str) {
    let dir = fixture_dir();
    let form_doc = read_json(&dir.join(format!("{}.form.json", form)));
    let values = read_json(&dir.join(format!("{}.values.json", case)));
    let expected = read_json(&dir.join(format!("{}.expected.json", case)));

    let result = sangha_eval::evaluate(&form_doc, &values)
        .unwrap_or_else(|e| panic!("Evaluation failed for {}: {}", case, e));
    let actual = result.to_json();

    assert_eq!(
        actual,
        expected,
        "Visibility mismatch for {}\n\nActual:\n{}\n\nExpected:\n{}",
        case,
        serde_json::to_string_pretty(&actual).unwrap(),
        serde_json::to_string_pretty(&expected).unwrap(),
    );
}

#[test]
fn registration_adult_member() {
    run_visibility_fixture("registration", "registration_adult_member");
}

#[test]
fn registration_minor_sports() {
    run_visibility_fixture("registration", "registration_minor_sports");
}

#[test]
fn registration_empty_snapshot() {
    run_visibility_fixture("registration", "registration_empty");
}

#[test]
fn malformed_rules_degrade_to_false() {
    run_visibility_fixture("malformed_rules", "malformed_rules");
}

#[test]
fn non_string_operator_hides_only_its_section() {
    let form_doc = serde_json::json!({
        "sections": [
            {"id": "a", "fields": [{"id": "x", "type": "text"}]},
            {"id": "b",
             "conditionalRules": [{"targetField": "x", "operator": 5, "action": "show"}],
             "fields": [{"id": "y", "type": "text"}]}
        ]
    });
    let values = serde_json::json!({"x": "1"});
    let result = sangha_eval::evaluate(&form_doc, &values).unwrap();
    assert_eq!(
        result.to_json(),
        serde_json::json!({"visibleSectionIds": ["a"], "visibleFieldIds": ["x"]})
    );
}

#[test]
fn registration_submission_drops_hidden_values() {
    let dir = fixture_dir();
    let form_doc = read_json(&dir.join("registration.form.json"));
    let values = serde_json::json!({
        "name": "Ravi",
        "age": "15",
        "member": "No",
        "member_since": "2019-06-01",
        "guardian_name": "Lakshmi",
        "region-khanda": "k1",
        "interests": ["sports"],
        "whatsapp": "true"
    });
    let kept = sangha_eval::submission(&form_doc, &values).unwrap();
    let keys: Vec<&str> = kept.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["age", "guardian_name", "interests", "member", "name"]);
}

#[test]
fn registration_form_passes_authoring_checks() {
    let dir = fixture_dir();
    let doc = read_json(&dir.join("registration.form.json"));
    let form = sangha_interchange::form_from_json(&doc).unwrap();
    let report = sangha_eval::check_form(&form);
    assert!(report.is_clean(), "{:?}", report.findings);
}
