//! Configuration management for the CLI.

use quarry_engine::Placeholder;
use std::env;
use std::path::PathBuf;

/// CLI configuration loaded from environment variables.
///
/// Command-line flags take precedence over every value here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Placeholder style for compiled filters
    pub placeholder: Placeholder,
    /// Schema applied when `--schema` is not given
    pub schema_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let placeholder = match lookup("QUARRY_PLACEHOLDER") {
            Some(value) => parse_placeholder(&value)?,
            None => Placeholder::default(),
        };

        let schema_path = lookup("QUARRY_SCHEMA")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            placeholder,
            schema_path,
        })
    }
}

/// Parse a placeholder style name.
pub fn parse_placeholder(value: &str) -> Result<Placeholder, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "object" => Ok(Placeholder::Object),
        "positional" => Ok(Placeholder::Positional),
        _ => Err(ConfigError::InvalidPlaceholder(value.to_string())),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid placeholder style '{0}' (expected 'object' or 'positional')")]
    InvalidPlaceholder(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.placeholder, Placeholder::Object);
        assert_eq!(config.schema_path, None);
    }

    #[test]
    fn reads_variables() {
        let config = Config::from_lookup(lookup(&[
            ("QUARRY_PLACEHOLDER", "Positional"),
            ("QUARRY_SCHEMA", "schema.json"),
        ]))
        .unwrap();
        assert_eq!(config.placeholder, Placeholder::Positional);
        assert_eq!(config.schema_path, Some(PathBuf::from("schema.json")));
    }

    #[test]
    fn blank_schema_path_ignored() {
        let config = Config::from_lookup(lookup(&[("QUARRY_SCHEMA", "  ")])).unwrap();
        assert_eq!(config.schema_path, None);
    }

    #[test]
    fn invalid_placeholder() {
        let result = Config::from_lookup(lookup(&[("QUARRY_PLACEHOLDER", "question")]));
        assert!(matches!(result, Err(ConfigError::InvalidPlaceholder(v)) if v == "question"));
    }
}
