//! Parser configuration (`brgen.toml`)
//!
//! ```toml
//! [parser]
//! error_tolerant = true
//! collect_comments = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Switches for one parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Record recoverable errors and keep going
    pub error_tolerant: bool,
    /// Attach `#` comments to the following element
    pub collect_comments: bool,
}

impl ParseOptions {
    #[must_use]
    pub fn tolerant() -> Self {
        Self {
            error_tolerant: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub parser: ParseOptions,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_strict() {
        let config = Config::from_toml_str("").unwrap();
        assert!(!config.parser.error_tolerant);
        assert!(!config.parser.collect_comments);
    }

    #[test]
    fn parser_table() {
        let config = Config::from_toml_str("[parser]\nerror_tolerant = true\n").unwrap();
        assert_eq!(config.parser, ParseOptions::tolerant());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("[parser]\nstrict = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[parser]\ncollect_comments = true").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert!(config.parser.collect_comments);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
