pub mod interactive_config;
pub mod logging_config;
pub mod transformations_config;

use crate::config::interactive_config::InteractiveModeConfig;
use crate::config::logging_config::LoggingConfig;
use crate::config::transformations_config::TransformationConfig;
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Main configuration structure matching config.json format
///
/// Rule definitions are kept as raw JSON values so that one malformed rule
/// is reported on its own instead of failing the whole document.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub transformations: Map<String, Value>,
    #[serde(default)]
    pub interactive_mode: InteractiveModeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path).map_err(|e| {
            Error::config_parse(config_path, format!("failed to read file: {}", e))
        })?;

        Self::parse(&content, config_path)
    }

    /// Parse and validate a config document; `origin` is only used in error messages
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| Error::config_parse(origin, format!("invalid JSON config: {}", e)))?;

        config
            .interactive_mode
            .clipboard_refresh
            .validate()
            .map_err(|reason| Error::config_parse(origin, reason))?;

        Ok(config)
    }

    /// Rule definitions in document order, each parsed independently
    pub fn transformation_entries(
        &self,
    ) -> impl Iterator<Item = (&str, std::result::Result<TransformationConfig, serde_json::Error>)>
    {
        self.transformations.iter().map(|(id, value)| {
            (
                id.as_str(),
                TransformationConfig::deserialize(value.clone()),
            )
        })
    }
}

/// Default location of the config document
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("clip-rules").join("config.json"))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "transformations": {
            "hyphen_to_underscore": { "name": "Hyphen to underscore", "pattern": "-", "replacement": "_" },
            "broken": { "pattern": "x" },
            "fullwidth_to_halfwidth": { "pattern": "", "replacement": "unicode_normalize_narrow" }
        },
        "interactive_mode": {
            "clipboard_refresh": { "auto_detection_interval": 2.5, "max_content_size": 64 }
        }
    }"#;

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        let refresh = &config.interactive_mode.clipboard_refresh;
        assert_eq!(refresh.auto_detection_interval, 2.5);
        assert_eq!(refresh.max_content_size, 64);
        assert!(config.logging.enabled);
    }

    #[test]
    fn test_transformation_entries_keep_document_order() {
        let config = Config::parse(SAMPLE, Path::new("inline")).unwrap();

        let entries: Vec<_> = config.transformation_entries().collect();
        let ids: Vec<&str> = entries.iter().map(|(id, _)| *id).collect();
        assert_eq!(
            ids,
            vec!["hyphen_to_underscore", "broken", "fullwidth_to_halfwidth"]
        );
        assert!(entries[0].1.is_ok());
        assert!(entries[1].1.is_err());
        assert!(entries[2].1.is_ok());
    }

    #[test]
    fn test_missing_transformations_is_parse_error() {
        let result = Config::parse(r#"{ "interactive_mode": {} }"#, Path::new("inline"));
        assert!(matches!(result, Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let result = Config::parse("{ \"transformations\": ", Path::new("broken.json"));
        match result {
            Err(Error::ConfigParse { path, reason }) => {
                assert_eq!(path, PathBuf::from("broken.json"));
                assert!(reason.contains("invalid JSON"));
            }
            other => panic!("Expected ConfigParse error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_settings_are_rejected_eagerly() {
        let json = r#"{
            "transformations": {},
            "interactive_mode": { "clipboard_refresh": { "auto_detection_interval": -1 } }
        }"#;
        assert!(matches!(
            Config::parse(json, Path::new("inline")),
            Err(Error::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_huge_interval_is_parse_error() {
        let json = r#"{
            "transformations": {},
            "interactive_mode": { "clipboard_refresh": { "auto_detection_interval": 1e20 } }
        }"#;
        match Config::parse(json, Path::new("inline")) {
            Err(Error::ConfigParse { reason, .. }) => assert!(reason.contains("too large")),
            other => panic!("Expected ConfigParse error, got {:?}", other),
        }
    }

    #[test]
    fn test_file_not_found() {
        let result = Config::from_file(Path::new("nonexistent.json"));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("failed to read file"));
    }
}
