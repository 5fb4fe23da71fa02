//! Append-only JSON-lines record of transformation runs.
//!
//! Events carry lengths and timings only, never the text itself.

use crate::error::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: DateTime<Local>,
    pub transformation: String,
    pub input_length: usize,
    pub output_length: usize,
    pub success: bool,
    pub error_message: Option<String>,
    pub execution_time_ms: f64,
}

#[derive(Debug)]
pub struct TransformLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl TransformLog {
    /// Open (or create) the log file for appending
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, event: &LogEvent) -> Result<()> {
        let line = serde_json::to_string(event).map_err(std::io::Error::from)?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| std::io::Error::other("transformation log lock poisoned"))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}
