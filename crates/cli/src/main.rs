mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::config::SanghaConfig;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Sangha form rules and organization hierarchy tools.
#[derive(Parser)]
#[command(
    name = "sangha",
    version,
    about = "Sangha form rules and organization hierarchy tools"
)]
struct Cli {
    /// Output format (text or json); defaults to the config file, then text
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Config file (default: ./sangha.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a form definition against the form JSON Schema
    Validate {
        /// Path to the form definition JSON
        form: PathBuf,
    },

    /// Run authoring checks on a form definition
    Check {
        /// Path to the form definition JSON
        form: PathBuf,
    },

    /// Print the visible section and field ids for a value snapshot
    Visibility {
        /// Path to the form definition JSON
        form: PathBuf,
        /// Path to the value snapshot JSON
        #[arg(long)]
        values: PathBuf,
    },

    /// Drop values of hidden fields from a submission
    Submit {
        /// Path to the form definition JSON
        form: PathBuf,
        /// Path to the submitted values JSON
        #[arg(long)]
        values: PathBuf,
    },

    /// Resolve a hierarchy selection into a readable path
    Path {
        #[command(flatten)]
        target: commands::hierarchy::TargetArgs,
    },

    /// List the options for the next hierarchy level after a selection
    Children {
        #[command(flatten)]
        target: commands::hierarchy::TargetArgs,
        /// Level to list instead of the next one
        #[arg(long)]
        level: Option<sangha_interchange::Level>,
    },

    /// Render a stored response as label/value rows
    Show {
        /// Path to the form definition JSON
        form: PathBuf,
        /// Path to the stored response JSON
        #[arg(long)]
        response: PathBuf,
        /// Organization tree JSON used to name hierarchy ids
        #[arg(long)]
        tree: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            report_error(&e, cli.output.unwrap_or(OutputFormat::Text), cli.quiet);
            process::exit(1);
        }
    };
    init_logging(&config);

    let output = cli
        .output
        .or(config.output.format)
        .unwrap_or(OutputFormat::Text);
    let quiet = cli.quiet;
    tracing::debug!(
        config = ?cli.config,
        tree = ?config.hierarchy.tree,
        ?output,
        "configuration loaded"
    );

    match cli.command {
        Commands::Validate { form } => {
            commands::validate::cmd_validate(&form, output, quiet);
        }
        Commands::Check { form } => {
            commands::check::cmd_check(&form, output, quiet);
        }
        Commands::Visibility { form, values } => {
            commands::visibility::cmd_visibility(&form, &values, output, quiet);
        }
        Commands::Submit { form, values } => {
            commands::visibility::cmd_submit(&form, &values, output, quiet);
        }
        Commands::Path { target } => {
            commands::hierarchy::cmd_path(&target, &config, output, quiet);
        }
        Commands::Children { target, level } => {
            commands::hierarchy::cmd_children(&target, level, &config, output, quiet);
        }
        Commands::Show {
            form,
            response,
            tree,
        } => {
            let tree = tree.or_else(|| config.hierarchy.tree.clone());
            commands::show::cmd_show(&form, &response, tree.as_deref(), output, quiet);
        }
    }
}

/// Logs go to stderr so stdout stays parseable. `RUST_LOG` wins over the
/// config file's `[logging] filter`.
fn init_logging(config: &SanghaConfig) {
    let fallback = config.logging.filter.as_deref().unwrap_or("warn");
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
