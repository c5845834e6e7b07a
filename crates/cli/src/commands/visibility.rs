use std::path::Path;
use std::process;

use crate::commands::{print_json, read_json};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_visibility(form_path: &Path, values_path: &Path, output: OutputFormat, quiet: bool) {
    let form = read_json(form_path, output, quiet);
    let values = read_json(values_path, output, quiet);

    let result = match sangha_eval::evaluate(&form, &values) {
        Ok(r) => r,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Text => {
            let join = |ids: &std::collections::BTreeSet<String>| {
                ids.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
            };
            println!("sections: {}", join(&result.visible_section_ids));
            println!("fields: {}", join(&result.visible_field_ids));
        }
    }
}

pub(crate) fn cmd_submit(form_path: &Path, values_path: &Path, output: OutputFormat, quiet: bool) {
    let form = read_json(form_path, output, quiet);
    let values = read_json(values_path, output, quiet);

    let kept = match sangha_eval::submission(&form, &values) {
        Ok(s) => s,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => print_json(&kept),
        OutputFormat::Text => {
            for (id, value) in kept.iter() {
                println!("{} = {}", id, sangha_hierarchy::display_value(value));
            }
        }
    }
}
