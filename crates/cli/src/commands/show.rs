use std::path::Path;
use std::process;

use sangha_hierarchy::HierarchyIndex;

use crate::commands::hierarchy::load_organizations;
use crate::commands::{print_json, read_json};
use crate::{report_error, OutputFormat};

/// Without a tree, hierarchy ids are shown raw.
pub(crate) fn cmd_show(
    form_path: &Path,
    response_path: &Path,
    tree_path: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let form_doc = read_json(form_path, output, quiet);
    let form = match sangha_interchange::form_from_json(&form_doc) {
        Ok(f) => f,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let response_doc = read_json(response_path, output, quiet);
    let response = match sangha_interchange::snapshot_from_json(&response_doc) {
        Ok(s) => s,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let index = match tree_path {
        Some(p) => sangha_hierarchy::build_index(&load_organizations(p, output, quiet)),
        None => HierarchyIndex::default(),
    };

    let rows = sangha_hierarchy::display_response(&form, &response, &index);

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            let width = rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0);
            for r in &rows {
                println!("{:<width$}  {}", r.label, r.value, width = width);
            }
        }
    }
}
