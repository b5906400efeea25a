//! Client configuration.

use crate::error::{DfdError, Result};
use crate::export::DotOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a diagram [`Client`](crate::Client)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// DOT file the diagram is loaded from and saved to
    pub dot_path: PathBuf,

    /// Written at the start of every exported line
    pub prefix: String,

    /// Indentation per nesting level in exported DOT
    pub indent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            dot_path: PathBuf::from("dfd.dot"),
            prefix: String::new(),
            indent: "\t".to_string(),
        }
    }
}

impl ClientConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DfdError::config("Failed to parse client configuration", Some(e)))
    }

    /// Read a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| DfdError::io(path, e))?;
        Self::from_json_str(&json)
    }

    /// Set the DOT file path
    pub fn with_dot_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.dot_path = path.into();
        self
    }

    /// Set the line prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the indentation string
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Export layout derived from this configuration
    pub fn dot_options(&self) -> DotOptions {
        DotOptions {
            prefix: self.prefix.clone(),
            indent: self.indent.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.dot_path, PathBuf::from("dfd.dot"));
        assert_eq!(config.dot_options(), DotOptions::default());
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::default()
            .with_dot_path("model/app.dot")
            .with_indent("    ");
        assert_eq!(config.dot_path, PathBuf::from("model/app.dot"));
        assert_eq!(config.dot_options().indent, "    ");
        assert_eq!(config.prefix, "");
    }

    #[test]
    fn test_from_json_partial() {
        let config = ClientConfig::from_json_str(r#"{"dot_path": "threat.dot"}"#).unwrap();
        assert_eq!(config.dot_path, PathBuf::from("threat.dot"));
        assert_eq!(config.indent, "\t");
    }

    #[test]
    fn test_from_json_invalid() {
        let err = ClientConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, DfdError::Config { .. }));
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = ClientConfig::default().with_prefix("// ");
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ClientConfig::from_json_str(&json).unwrap(), config);
    }
}
