//! `sangha.toml` settings.
//!
//! ```toml
//! [output]
//! format = "json"
//!
//! [logging]
//! filter = "sangha_hierarchy=debug"
//!
//! [hierarchy]
//! tree = "organizations.json"
//! ```
//!
//! Every section is optional. Command-line flags override the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::OutputFormat;

pub(crate) const DEFAULT_CONFIG_FILE: &str = "sangha.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SanghaConfig {
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub hierarchy: HierarchySettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct OutputSettings {
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct HierarchySettings {
    /// Organization tree JSON for `path`, `children` and `show`.
    pub tree: Option<PathBuf>,
}

pub(crate) fn read_config(path: &Path) -> Result<SanghaConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    parse_config(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

fn parse_config(content: &str) -> Result<SanghaConfig, toml::de::Error> {
    toml::from_str(content)
}

/// An explicit path must exist. Without one, `./sangha.toml` is read if
/// present and defaults are used otherwise.
pub(crate) fn load(explicit: Option<&Path>) -> Result<SanghaConfig, String> {
    match explicit {
        Some(path) => read_config(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                read_config(default)
            } else {
                Ok(SanghaConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = parse_config("").unwrap();
        assert!(config.output.format.is_none());
        assert!(config.logging.filter.is_none());
        assert!(config.hierarchy.tree.is_none());
    }

    #[test]
    fn full_file_parses() {
        let config = parse_config(
            r#"
            [output]
            format = "json"

            [logging]
            filter = "sangha_eval=trace"

            [hierarchy]
            tree = "data/organizations.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert_eq!(config.logging.filter.as_deref(), Some("sangha_eval=trace"));
        assert_eq!(
            config.hierarchy.tree,
            Some(PathBuf::from("data/organizations.json"))
        );
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(parse_config("[output]\nformat = \"yaml\"\n").is_err());
        assert!(parse_config("[server]\nport = 1\n").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load(Some(Path::new("definitely/not/here.toml"))).unwrap_err();
        assert!(err.contains("could not read"));
    }
}
