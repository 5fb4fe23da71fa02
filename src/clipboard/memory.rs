use super::ClipboardProvider;
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// In-process clipboard, used by tests and headless runs
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    content: Mutex<String>,
    failing: AtomicBool,
    reads: AtomicU32,
    writes: Mutex<Vec<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        let clipboard = Self::new();
        clipboard.set_text(text);
        clipboard
    }

    /// Clipboard whose every access fails
    pub fn with_failure() -> Self {
        let clipboard = Self::new();
        clipboard.set_failing(true);
        clipboard
    }

    /// Simulate an external program changing the clipboard
    pub fn set_text(&self, text: &str) {
        if let Ok(mut content) = self.content.lock() {
            *content = text.to_string();
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn text(&self) -> String {
        self.content
            .lock()
            .map(|content| content.clone())
            .unwrap_or_default()
    }

    /// Number of read attempts so far, failed ones included
    pub fn read_count(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Texts written through the provider, oldest first
    pub fn written(&self) -> Vec<String> {
        self.writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::ClipboardAccess(
                "simulated clipboard failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ClipboardProvider for MemoryClipboard {
    async fn read_text(&self) -> Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.text())
    }

    async fn write_text(&self, text: &str) -> Result<()> {
        self.check_available()?;
        self.set_text(text);
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(text.to_string());
        }
        Ok(())
    }
}
