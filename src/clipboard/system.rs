//! Clipboard access through the platform's clipboard command-line tools

use super::ClipboardProvider;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

const COMMAND_TIMEOUT: Duration = Duration::from_secs(2);
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);

/// One external program invocation
#[derive(Debug, Clone, PartialEq)]
struct ToolCommand {
    program: PathBuf,
    args: Vec<&'static str>,
}

/// Reader/writer pair for one clipboard backend
#[derive(Debug, Clone, Copy, PartialEq)]
struct Backend {
    name: &'static str,
    read: (&'static str, &'static [&'static str]),
    write: (&'static str, &'static [&'static str]),
}

const MACOS: Backend = Backend {
    name: "pbpaste/pbcopy",
    read: ("pbpaste", &[]),
    write: ("pbcopy", &[]),
};

const WAYLAND: Backend = Backend {
    name: "wl-clipboard",
    read: ("wl-paste", &["--no-newline"]),
    write: ("wl-copy", &[]),
};

const XCLIP: Backend = Backend {
    name: "xclip",
    read: ("xclip", &["-selection", "clipboard", "-o"]),
    write: ("xclip", &["-selection", "clipboard", "-i"]),
};

const XSEL: Backend = Backend {
    name: "xsel",
    read: ("xsel", &["--clipboard", "--output"]),
    write: ("xsel", &["--clipboard", "--input"]),
};

const POWERSHELL: Backend = Backend {
    name: "powershell",
    read: ("powershell", &["-NoProfile", "-Command", "Get-Clipboard -Raw"]),
    write: ("powershell", &["-NoProfile", "-Command", "$input | Set-Clipboard"]),
};

/// Backends to try, most specific first
fn candidate_backends(wayland: bool) -> Vec<Backend> {
    let mut backends = Vec::new();
    if cfg!(target_os = "macos") {
        backends.push(MACOS);
    }
    if cfg!(windows) {
        backends.push(POWERSHELL);
    }
    if wayland {
        backends.push(WAYLAND);
    }
    backends.push(XCLIP);
    backends.push(XSEL);
    backends
}

#[derive(Debug, Clone)]
pub struct SystemClipboard {
    backend: &'static str,
    read: ToolCommand,
    write: ToolCommand,
}

impl SystemClipboard {
    /// Pick the first backend whose tools are installed
    pub fn detect() -> Result<Self> {
        let wayland = std::env::var_os("WAYLAND_DISPLAY").is_some();

        for backend in candidate_backends(wayland) {
            let (Ok(read), Ok(write)) = (
                which::which(backend.read.0),
                which::which(backend.write.0),
            ) else {
                debug!("Clipboard backend {} not available", backend.name);
                continue;
            };

            debug!("Using clipboard backend {}", backend.name);
            return Ok(Self {
                backend: backend.name,
                read: ToolCommand {
                    program: read,
                    args: backend.read.1.to_vec(),
                },
                write: ToolCommand {
                    program: write,
                    args: backend.write.1.to_vec(),
                },
            });
        }

        Err(Error::ClipboardAccess(
            "no clipboard tool found (install pbcopy, wl-clipboard, xclip or xsel)".to_string(),
        ))
    }

    pub fn backend(&self) -> &str {
        self.backend
    }

    async fn read_once(&self) -> Result<String> {
        let child = Command::new(&self.read.program)
            .args(&self.read.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(COMMAND_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| Error::ClipboardAccess("clipboard read timed out".to_string()))??;

        if !output.status.success() {
            return Err(Error::ClipboardAccess(format!(
                "{} exited with {}: {}",
                self.read.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        String::from_utf8(output.stdout).map_err(|_| {
            Error::ClipboardAccess("clipboard content is not valid UTF-8 text".to_string())
        })
    }

    async fn write_once(&self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.write.program)
            .args(&self.write.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let write = async {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(text.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            child.wait_with_output().await
        };

        let output = tokio::time::timeout(COMMAND_TIMEOUT, write)
            .await
            .map_err(|_| Error::ClipboardAccess("clipboard write timed out".to_string()))??;

        if output.status.success() {
            Ok(())
        } else {
            Err(Error::ClipboardAccess(format!(
                "{} exited with {}: {}",
                self.write.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

/// Run an operation up to `MAX_ATTEMPTS` times with doubling delays
async fn with_retry<T, F, Fut>(operation: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut delay = INITIAL_BACKOFF;
    let mut tries = 1;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if tries < MAX_ATTEMPTS => {
                warn!("Clipboard {} failed (attempt {}): {}", operation, tries, e);
                tokio::time::sleep(delay).await;
                delay *= 2;
                tries += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[async_trait::async_trait]
impl ClipboardProvider for SystemClipboard {
    async fn read_text(&self) -> Result<String> {
        with_retry("read", || self.read_once()).await
    }

    async fn write_text(&self, text: &str) -> Result<()> {
        with_retry("write", || self.write_once(text)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_wayland_preferred_over_x11() {
        let backends = candidate_backends(true);
        let wayland = backends.iter().position(|b| *b == WAYLAND).unwrap();
        let xclip = backends.iter().position(|b| *b == XCLIP).unwrap();
        assert!(wayland < xclip);
    }

    #[test]
    fn test_x11_backends_without_wayland() {
        let backends = candidate_backends(false);
        assert!(!backends.contains(&WAYLAND));
        assert!(backends.contains(&XCLIP));
        assert!(backends.contains(&XSEL));
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_retry("read", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::ClipboardAccess("busy".to_string()))
            } else {
                Ok("text".to_string())
            }
        })
        .await;

        assert_eq!(result.unwrap(), "text");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = with_retry("write", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Error::ClipboardAccess("busy".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }
}
