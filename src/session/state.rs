use chrono::{DateTime, Local};
use std::fmt;

/// Where the working text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    Clipboard,
    Pipe,
    Manual,
    CommandResult,
}

impl fmt::Display for TextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TextSource::Clipboard => "clipboard",
            TextSource::Pipe => "pipe",
            TextSource::Manual => "manual",
            TextSource::CommandResult => "command-result",
        };
        f.write_str(label)
    }
}

/// Mutable record of the session's working text
#[derive(Debug, Clone)]
pub struct SessionState {
    current_text: String,
    text_source: TextSource,
    last_update_time: DateTime<Local>,
    auto_detection_enabled: bool,
}

/// Read-only view for status display; deliberately excludes the text itself
#[derive(Debug, Clone, PartialEq)]
pub struct StatusInfo {
    pub text_length: usize,
    pub text_source: TextSource,
    pub last_update_time: DateTime<Local>,
    pub auto_detection_enabled: bool,
    pub monitor_active: bool,
}

impl SessionState {
    pub fn new(auto_detection_enabled: bool) -> Self {
        Self {
            current_text: String::new(),
            text_source: TextSource::Manual,
            last_update_time: Local::now(),
            auto_detection_enabled,
        }
    }

    pub fn update_working_text(&mut self, text: String, source: TextSource) {
        self.current_text = text;
        self.text_source = source;
        self.last_update_time = Local::now();
    }

    pub fn current_text(&self) -> &str {
        &self.current_text
    }

    pub fn text_source(&self) -> TextSource {
        self.text_source
    }

    pub fn last_update_time(&self) -> DateTime<Local> {
        self.last_update_time
    }

    pub fn auto_detection_enabled(&self) -> bool {
        self.auto_detection_enabled
    }

    pub(crate) fn set_auto_detection(&mut self, enabled: bool) {
        self.auto_detection_enabled = enabled;
    }

    pub fn status_info(&self, monitor_active: bool) -> StatusInfo {
        StatusInfo {
            text_length: self.current_text.chars().count(),
            text_source: self.text_source,
            last_update_time: self.last_update_time,
            auto_detection_enabled: self.auto_detection_enabled,
            monitor_active,
        }
    }
}

impl fmt::Display for StatusInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on_off = |flag: bool| if flag { "on" } else { "off" };
        writeln!(f, "Working text:   {} chars", self.text_length)?;
        writeln!(f, "Source:         {}", self.text_source)?;
        writeln!(
            f,
            "Last update:    {}",
            self.last_update_time.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "Auto-detection: {}", on_off(self.auto_detection_enabled))?;
        write!(f, "Monitor:        {}", if self.monitor_active { "running" } else { "idle" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_empty() {
        let state = SessionState::new(false);
        assert_eq!(state.current_text(), "");
        assert_eq!(state.text_source(), TextSource::Manual);
        assert!(!state.auto_detection_enabled());
    }

    #[test]
    fn test_update_stamps_time_and_source() {
        let mut state = SessionState::new(false);
        let before = state.last_update_time();

        state.update_working_text("港区１ー１".to_string(), TextSource::Clipboard);
        assert_eq!(state.current_text(), "港区１ー１");
        assert_eq!(state.text_source(), TextSource::Clipboard);
        assert!(state.last_update_time() >= before);
    }

    #[test]
    fn test_status_counts_chars_and_hides_text() {
        let mut state = SessionState::new(true);
        state.update_working_text("password-123 港".to_string(), TextSource::Pipe);

        let status = state.status_info(true);
        assert_eq!(status.text_length, 14);
        assert_eq!(status.text_source, TextSource::Pipe);
        assert!(status.auto_detection_enabled);
        assert!(status.monitor_active);

        let rendered = status.to_string();
        assert!(rendered.contains("14 chars"));
        assert!(rendered.contains("pipe"));
        assert!(!rendered.contains("password"));
    }

    #[test]
    fn test_text_source_labels() {
        assert_eq!(TextSource::CommandResult.to_string(), "command-result");
        assert_eq!(TextSource::Clipboard.to_string(), "clipboard");
    }
}
