//! Configuration Loader
//!
//! Loads the client configuration from built-in defaults, JSON files and the
//! environment, in that order.

use crate::config::settings::ClientConfig;
use crate::error::{CopilotError, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing at a custom config file
pub const CONFIG_PATH_ENV: &str = "COPILOT_CHAT_CONFIG";

/// Configuration loader with support for multiple sources
pub struct ConfigLoader {
    /// Merged JSON object; later sources override earlier keys
    merged: Map<String, Value>,
}

impl ConfigLoader {
    /// Create a new config loader and load from default locations
    pub fn new() -> Result<Self> {
        let mut loader = Self::with_defaults()?;
        loader.load_from_default_paths()?;
        Ok(loader)
    }

    /// Create a loader with a specific config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut loader = Self::with_defaults()?;
        loader.load_from_file(path)?;
        Ok(loader)
    }

    fn with_defaults() -> Result<Self> {
        let mut loader = Self { merged: Map::new() };
        loader.merge(serde_json::to_value(ClientConfig::default())?);
        Ok(loader)
    }

    /// Load configuration from default paths
    fn load_from_default_paths(&mut self) -> Result<()> {
        for path in Self::get_config_paths() {
            if path.exists() {
                self.load_from_file(&path)?;
            }
        }

        Ok(())
    }

    /// Get list of config paths to check, lowest precedence first
    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("copilot-chat").join("config.json"));
        }

        paths.push(PathBuf::from("copilot-chat.json"));

        if let Ok(custom_path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(custom_path));
        }

        paths
    }

    /// Load configuration from a specific file
    fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CopilotError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let value: Value = serde_json::from_str(&content).map_err(|e| {
            CopilotError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        if !value.is_object() {
            return Err(CopilotError::Config(format!(
                "{} must contain a JSON object",
                path.display()
            )));
        }

        debug!(path = %path.display(), "loaded config file");
        self.merge(value);
        Ok(())
    }

    /// Merge another config object into this one (later keys override earlier)
    fn merge(&mut self, other: Value) {
        if let Value::Object(obj) = other {
            self.merged.extend(obj);
        }
    }

    /// Build the final configuration, applying environment overrides
    pub fn into_config(self) -> Result<ClientConfig> {
        let mut config: ClientConfig = serde_json::from_value(Value::Object(self.merged))
            .map_err(|e| CopilotError::Config(format!("Invalid configuration: {}", e)))?;
        config.apply_env();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_custom_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
                "completions_url": "http://127.0.0.1:9000/chat",
                "models_url": "http://127.0.0.1:9000/models",
                "fallback_model": "gpt-4o-mini"
            }}"#
        )
        .unwrap();

        let config = ConfigLoader::from_path(file.path())
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config.completions_url, "http://127.0.0.1:9000/chat");
        assert_eq!(
            config.models_url.as_deref(),
            Some("http://127.0.0.1:9000/models")
        );
        assert_eq!(config.fallback_model, "gpt-4o-mini");
        // Untouched keys keep their defaults
        assert_eq!(config.request_timeout_secs, 300);
    }

    #[test]
    fn test_merge_later_wins() {
        let mut loader = ConfigLoader::with_defaults().unwrap();
        loader.merge(serde_json::json!({"fallback_model": "first", "user_agent": "ua/1"}));
        loader.merge(serde_json::json!({"fallback_model": "second"}));

        let config = loader.into_config().unwrap();
        assert_eq!(config.fallback_model, "second");
        assert_eq!(config.user_agent, "ua/1");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();

        assert!(matches!(
            ConfigLoader::from_path(file.path()),
            Err(CopilotError::Config(_))
        ));
    }

    #[test]
    fn test_non_object_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[1, 2, 3]").unwrap();

        assert!(matches!(
            ConfigLoader::from_path(file.path()),
            Err(CopilotError::Config(_))
        ));
    }

    #[test]
    fn test_wrong_field_type_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"request_timeout_secs": "soon"}}"#).unwrap();

        let loader = ConfigLoader::from_path(file.path()).unwrap();
        assert!(matches!(loader.into_config(), Err(CopilotError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        assert!(matches!(
            ConfigLoader::from_path("/definitely/not/here/copilot-chat.json"),
            Err(CopilotError::Config(_))
        ));
    }
}
