use serde::Deserialize;
use std::path::PathBuf;

// `logging` section of the config document
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Where the transformation log goes, or None when logging is off
    pub fn log_path(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        self.file.clone().or_else(default_log_path)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("clip-rules").join("transformations.log"))
}
