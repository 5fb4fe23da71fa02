pub mod clipboard;
pub mod config;
pub mod error;
pub mod hotkey;
pub mod session;
pub mod transform;
pub mod watcher;

// Public API
pub use clipboard::{ClipboardMonitor, ClipboardProvider, MemoryClipboard, SystemClipboard};
pub use config::Config;
pub use error::{Error, Result};
pub use hotkey::{HotkeyBinding, RuleInvoker};
pub use session::{
    CommandProcessor, CommandResult, InteractiveSession, Session, SessionState, TextSource,
};
pub use transform::{TransformResult, TransformationEngine, TransformationRule};
pub use watcher::ConfigWatcher;
