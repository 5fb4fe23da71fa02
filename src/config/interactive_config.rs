use serde::Deserialize;
use std::time::Duration;

// `interactive_mode` section of the config document
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct InteractiveModeConfig {
    #[serde(default)]
    pub clipboard_refresh: ClipboardRefreshConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ClipboardRefreshConfig {
    /// Seconds between clipboard polls while auto-detection is on
    #[serde(default = "default_auto_detection_interval")]
    pub auto_detection_interval: f64,
    /// Largest clipboard payload, in bytes, accepted into the working text
    #[serde(default = "default_max_content_size")]
    pub max_content_size: usize,
    #[serde(default)]
    pub enable_auto_detection_by_default: bool,
    #[serde(default = "default_true")]
    pub show_character_count: bool,
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
    /// Consecutive failed polls after which the monitor stops itself
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

impl Default for ClipboardRefreshConfig {
    fn default() -> Self {
        Self {
            auto_detection_interval: default_auto_detection_interval(),
            max_content_size: default_max_content_size(),
            enable_auto_detection_by_default: false,
            show_character_count: default_true(),
            show_timestamps: default_true(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

impl ClipboardRefreshConfig {
    /// Polling period; out-of-range values fall back to the default
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.auto_detection_interval).unwrap_or_else(|_| {
            Duration::from_secs_f64(default_auto_detection_interval())
        })
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        if !self.auto_detection_interval.is_finite() || self.auto_detection_interval <= 0.0 {
            return Err(format!(
                "auto_detection_interval must be a positive number of seconds, got {}",
                self.auto_detection_interval
            ));
        }
        if Duration::try_from_secs_f64(self.auto_detection_interval).is_err() {
            return Err(format!(
                "auto_detection_interval of {} seconds is too large",
                self.auto_detection_interval
            ));
        }
        if self.max_content_size == 0 {
            return Err("max_content_size must be greater than zero".to_string());
        }
        if self.max_consecutive_failures == 0 {
            return Err("max_consecutive_failures must be greater than zero".to_string());
        }
        Ok(())
    }
}

fn default_auto_detection_interval() -> f64 {
    1.0
}

fn default_max_content_size() -> usize {
    1024 * 1024
}

fn default_max_consecutive_failures() -> u32 {
    5
}

fn default_true() -> bool {
    true
}
