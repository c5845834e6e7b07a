use std::path::Path;
use std::process;

use sangha_eval::Severity;

use crate::commands::{print_json, read_json};
use crate::{report_error, OutputFormat};

/// Exits 1 when any finding is an error; warnings alone pass.
pub(crate) fn cmd_check(form_path: &Path, output: OutputFormat, quiet: bool) {
    let doc = read_json(form_path, output, quiet);
    let form = match sangha_interchange::form_from_json(&doc) {
        Ok(f) => f,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let report = sangha_eval::check_form(&form);

    if !quiet {
        match output {
            OutputFormat::Json => print_json(&report),
            OutputFormat::Text => {
                println!("Form Check Report");
                println!("=================");
                println!();
                let section_count = form.sections.len();
                let field_count = form.all_fields().len();
                println!("  Sections: {}, fields: {}", section_count, field_count);
                if report.is_clean() {
                    println!("  No findings.");
                } else {
                    for f in &report.findings {
                        let tag = match f.severity {
                            Severity::Error => "error",
                            Severity::Warning => "warning",
                        };
                        println!("  {}[{}] {}: {}", tag, f.check, f.location, f.message);
                    }
                    let errors = report
                        .findings
                        .iter()
                        .filter(|f| f.severity == Severity::Error)
                        .count();
                    println!();
                    println!(
                        "  {} error(s), {} warning(s)",
                        errors,
                        report.findings.len() - errors
                    );
                }
            }
        }
    }

    if report.has_errors() {
        process::exit(1);
    }
}
