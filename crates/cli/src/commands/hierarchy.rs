use std::path::{Path, PathBuf};
use std::process;

use clap::Args;

use sangha_hierarchy::{HierarchySelector, OrgTree, Selection, SelectorState};
use sangha_interchange::{Level, Organization};

use crate::commands::{print_json, read_json};
use crate::config::SanghaConfig;
use crate::{report_error, OutputFormat};

/// A tree file plus a (possibly partial) selection in it.
#[derive(Debug, Args)]
pub(crate) struct TargetArgs {
    /// Organization tree JSON (`{"organizations": [...]}` or a bare array)
    #[arg(long)]
    pub tree: Option<PathBuf>,
    #[arg(long)]
    pub khanda: Option<String>,
    #[arg(long)]
    pub valaya: Option<String>,
    /// Milan id, or milan name under a khanda without valayas
    #[arg(long)]
    pub milan: Option<String>,
    #[arg(long)]
    pub ghata: Option<String>,
}

impl TargetArgs {
    fn selection(&self) -> Selection {
        let mut selection = Selection::new();
        selection.set(Level::Khanda, self.khanda.as_deref());
        selection.set(Level::Valaya, self.valaya.as_deref());
        selection.set(Level::Milan, self.milan.as_deref());
        selection.set(Level::Ghata, self.ghata.as_deref());
        selection
    }
}

fn tree_path<'a>(
    args: &'a TargetArgs,
    config: &'a SanghaConfig,
    output: OutputFormat,
    quiet: bool,
) -> &'a Path {
    match args.tree.as_deref().or(config.hierarchy.tree.as_deref()) {
        Some(p) => p,
        None => {
            report_error(
                "error: no organization tree given; pass --tree or set [hierarchy] tree in sangha.toml",
                output,
                quiet,
            );
            process::exit(1);
        }
    }
}

pub(crate) fn load_organizations(path: &Path, output: OutputFormat, quiet: bool) -> Vec<Organization> {
    let doc = read_json(path, output, quiet);
    match sangha_interchange::organizations_from_json(&doc) {
        Ok(orgs) => {
            tracing::debug!(path = %path.display(), organizations = orgs.len(), "loaded tree");
            orgs
        }
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn cmd_path(args: &TargetArgs, config: &SanghaConfig, output: OutputFormat, quiet: bool) {
    let orgs = load_organizations(tree_path(args, config, output, quiet), output, quiet);
    let index = sangha_hierarchy::build_index(&orgs);
    let selection = args.selection();
    let path = sangha_hierarchy::resolve_path(&index, &selection);

    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => println!("{}", path),
        OutputFormat::Json => print_json(&serde_json::json!({
            "selection": selection,
            "path": path,
        })),
    }
}

/// Replays the selection level by level, so a later level given without
/// its parent is cleared the same way the form selector would clear it.
pub(crate) fn cmd_children(
    args: &TargetArgs,
    level: Option<Level>,
    config: &SanghaConfig,
    output: OutputFormat,
    quiet: bool,
) {
    let orgs = load_organizations(tree_path(args, config, output, quiet), output, quiet);
    let tree = OrgTree::from_organizations(&orgs);

    let mut selector = HierarchySelector::new();
    let wanted = args.selection();
    for (lvl, value) in wanted.levels() {
        if let Some(value) = value {
            selector.select(lvl, value);
        }
    }

    let level = level.unwrap_or_else(|| next_level(&selector, &tree));
    let choices = selector.available(level, &tree);

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "level": level,
            "state": selector.state(),
            "selection": selector.selection(),
            "choices": choices,
        })),
        OutputFormat::Text => {
            println!("{} options:", level);
            if choices.is_empty() {
                println!("  (none)");
            }
            for c in &choices {
                if c.value == c.label {
                    println!("  {}", c.label);
                } else {
                    println!("  {} ({})", c.label, c.value);
                }
            }
        }
    }
}

fn next_level(selector: &HierarchySelector, tree: &OrgTree) -> Level {
    match selector.state() {
        SelectorState::NoneSelected => Level::Khanda,
        SelectorState::KhandaSelected => {
            let no_valayas = selector
                .selection()
                .khanda
                .as_deref()
                .and_then(|k| tree.khanda(k))
                .map(|k| k.valayas.is_empty())
                .unwrap_or(false);
            if no_valayas {
                Level::Milan
            } else {
                Level::Valaya
            }
        }
        SelectorState::ValayaSelected => Level::Milan,
        SelectorState::MilanSelected => Level::Ghata,
    }
}
