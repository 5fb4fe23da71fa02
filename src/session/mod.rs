pub mod command;
pub mod interactive;
pub mod state;

pub use command::{BuiltinCommand, CommandProcessor, CommandResult};
pub use interactive::InteractiveSession;
pub use state::{SessionState, StatusInfo, TextSource};

use crate::clipboard::{ClipboardMonitor, ClipboardProvider};
use crate::config::interactive_config::ClipboardRefreshConfig;
use std::sync::Arc;

/// Working text plus the clipboard monitor that feeds it
pub struct Session {
    state: SessionState,
    monitor: ClipboardMonitor,
    clipboard: Arc<dyn ClipboardProvider>,
    settings: ClipboardRefreshConfig,
}

impl Session {
    pub fn new(clipboard: Arc<dyn ClipboardProvider>, settings: ClipboardRefreshConfig) -> Self {
        let monitor = ClipboardMonitor::new(
            Arc::clone(&clipboard),
            settings.poll_interval(),
            settings.max_consecutive_failures,
        );
        Self {
            state: SessionState::new(settings.enable_auto_detection_by_default),
            monitor,
            clipboard,
            settings,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn monitor(&self) -> &ClipboardMonitor {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut ClipboardMonitor {
        &mut self.monitor
    }

    pub fn clipboard(&self) -> &Arc<dyn ClipboardProvider> {
        &self.clipboard
    }

    pub fn settings(&self) -> &ClipboardRefreshConfig {
        &self.settings
    }

    pub fn status_info(&self) -> StatusInfo {
        self.state.status_info(self.monitor.is_monitoring())
    }

    /// Set the auto-detection flag and start or stop the monitor to match
    pub async fn toggle_auto_detection(&mut self, enabled: bool) {
        self.state.set_auto_detection(enabled);
        if enabled {
            self.monitor.start();
        } else {
            self.monitor.stop().await;
        }
    }

    /// Stop background polling before the session goes away
    pub async fn shutdown(&mut self) {
        self.monitor.stop().await;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.status_info())
            .field("monitor", &self.monitor)
            .field("settings", &self.settings)
            .finish()
    }
}
