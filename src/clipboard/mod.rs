pub mod memory;
pub mod monitor;
pub mod system;

pub use memory::MemoryClipboard;
pub use monitor::{ClipboardCheck, ClipboardMonitor, MonitorEvent};
pub use system::SystemClipboard;

use crate::error::Result;

/// Clipboard read/write capability
#[async_trait::async_trait]
pub trait ClipboardProvider: Send + Sync {
    async fn read_text(&self) -> Result<String>;
    async fn write_text(&self, text: &str) -> Result<()>;
}
