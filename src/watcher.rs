use crate::transform::TransformationEngine;
use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Result as NotifyResult, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const DEBOUNCE: Duration = Duration::from_millis(500);

/// Reloads the engine's rules when its config document changes on disk
pub struct ConfigWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWatcher")
            .field("path", &self.path)
            .field("_watcher", &"<watcher>")
            .finish()
    }
}

impl ConfigWatcher {
    /// Watch `engine`'s config document; must be called inside a tokio runtime
    pub fn new(engine: TransformationEngine) -> Result<Self> {
        let path = engine
            .config_path()
            .map(Path::to_path_buf)
            .context("Engine was not loaded from a config file")?;
        let file_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .context("Config path has no file name")?;
        // Editors often replace the file, so watch its directory
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: NotifyResult<notify::Event>| {
            let Ok(event) = res else {
                return;
            };
            let relevant = matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) && event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(file_name.as_os_str()));
            if relevant {
                let _ = tx.send(());
            }
        })?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;

        let task = tokio::spawn(reload_on_change(engine, rx));
        tracing::info!("Watching {} for rule changes", path.display());

        Ok(Self {
            path,
            _watcher: watcher,
            task,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn reload_on_change(engine: TransformationEngine, mut changes: mpsc::UnboundedReceiver<()>) {
    while changes.recv().await.is_some() {
        // Wait for the write to settle, then fold the burst into one reload
        tokio::time::sleep(DEBOUNCE).await;
        while changes.try_recv().is_ok() {}

        match engine.reload_rules().await {
            Ok(report) => {
                tracing::info!("Rules reloaded: {} active", report.loaded);
                for rejected in &report.rejected {
                    tracing::warn!("Rule skipped on reload: {}", rejected);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to reload rules: {}. Keeping existing rules active", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_requires_config_path() {
        let config = Config::parse(r#"{ "transformations": {} }"#, Path::new("inline")).unwrap();
        let (engine, _) = TransformationEngine::new(&config, None);
        assert!(ConfigWatcher::new(engine).is_err());
    }

    #[tokio::test]
    async fn test_reloads_after_file_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "transformations": { "a": { "pattern": "a", "replacement": "b" } } }"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        let (engine, _) = TransformationEngine::new(&config, Some(path.clone()));
        let watcher = ConfigWatcher::new(engine.clone()).unwrap();
        assert_eq!(watcher.path(), path.as_path());

        std::fs::write(
            &path,
            r#"{ "transformations": { "c": { "pattern": "c", "replacement": "d" } } }"#,
        )
        .unwrap();

        let mut reloaded = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if engine.available_transformations().await == vec!["c"] {
                reloaded = true;
                break;
            }
        }
        assert!(reloaded, "rules were not reloaded");
    }
}
