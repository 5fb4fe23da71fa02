use super::ClipboardProvider;
use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Notifications from the background poll, in detection order
#[derive(Debug)]
pub enum MonitorEvent {
    Changed {
        content: String,
        detected_at: DateTime<Local>,
    },
    /// Polling stopped itself after too many consecutive read failures
    Degraded(Error),
}

/// Result of an on-demand clipboard check
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardCheck {
    pub content: String,
    pub changed: bool,
}

#[derive(Debug, Default)]
struct ClipboardSnapshot {
    last_content: Option<String>,
    last_check_time: Option<DateTime<Local>>,
}

impl ClipboardSnapshot {
    /// Record the content just read; true when it differs from the previous one
    fn observe(&mut self, content: &str) -> bool {
        self.last_check_time = Some(Local::now());
        if self.last_content.as_deref() == Some(content) {
            return false;
        }
        self.last_content = Some(content.to_string());
        true
    }
}

struct PollTask {
    handle: JoinHandle<()>,
    shutdown: oneshot::Sender<()>,
}

/// Polls the clipboard in the background and reports changes.
///
/// `Idle` until `start`, `Monitoring` until `stop` or until reads fail
/// `max_failures` times in a row.
pub struct ClipboardMonitor {
    clipboard: Arc<dyn ClipboardProvider>,
    interval: Duration,
    max_failures: u32,
    snapshot: Arc<Mutex<ClipboardSnapshot>>,
    running: Arc<AtomicBool>,
    task: Option<PollTask>,
    events_tx: UnboundedSender<MonitorEvent>,
    events_rx: UnboundedReceiver<MonitorEvent>,
}

impl ClipboardMonitor {
    pub fn new(
        clipboard: Arc<dyn ClipboardProvider>,
        interval: Duration,
        max_failures: u32,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            clipboard,
            interval,
            max_failures: max_failures.max(1),
            snapshot: Arc::new(Mutex::new(ClipboardSnapshot::default())),
            running: Arc::new(AtomicBool::new(false)),
            task: None,
            events_tx,
            events_rx,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the background poll; no-op when already monitoring
    pub fn start(&mut self) {
        if self.is_monitoring() {
            return;
        }

        // A task that stopped itself after degrading has already exited
        if let Some(finished) = self.task.take() {
            finished.handle.abort();
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.running.store(true, Ordering::SeqCst);

        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.clipboard),
            self.interval,
            self.max_failures,
            Arc::clone(&self.snapshot),
            Arc::clone(&self.running),
            self.events_tx.clone(),
            shutdown_rx,
        ));

        self.task = Some(PollTask {
            handle,
            shutdown: shutdown_tx,
        });
        info!("Clipboard monitoring started (every {:?})", self.interval);
    }

    /// Stop the background poll and wait for it to finish.
    ///
    /// No clipboard reads happen once this returns. No-op when idle.
    pub async fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        if task.shutdown.send(()).is_err() {
            debug!("Clipboard poll task had already finished");
        }
        if let Err(e) = task.handle.await {
            warn!("Clipboard poll task ended abnormally: {}", e);
        }

        self.running.store(false, Ordering::SeqCst);
        *self.snapshot.lock().await = ClipboardSnapshot::default();
        info!("Clipboard monitoring stopped");
    }

    /// Read the clipboard now and compare with the last known content
    pub async fn check_for_changes(&self) -> Result<ClipboardCheck> {
        let content = self.clipboard.read_text().await?;
        let changed = self.snapshot.lock().await.observe(&content);
        Ok(ClipboardCheck { content, changed })
    }

    /// Treat text written by this application as already seen
    pub async fn acknowledge(&self, content: &str) {
        self.snapshot.lock().await.observe(content);
    }

    /// Time of the most recent clipboard read, if any
    pub async fn last_check_time(&self) -> Option<DateTime<Local>> {
        self.snapshot.lock().await.last_check_time
    }

    /// Next pending event without waiting
    pub fn try_next_event(&mut self) -> Option<MonitorEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Wait for the next event
    pub async fn next_event(&mut self) -> Option<MonitorEvent> {
        self.events_rx.recv().await
    }

    /// All pending events in detection order
    pub fn drain_events(&mut self) -> Vec<MonitorEvent> {
        std::iter::from_fn(|| self.try_next_event()).collect()
    }
}

impl Drop for ClipboardMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.handle.abort();
        }
    }
}

impl std::fmt::Debug for ClipboardMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardMonitor")
            .field("interval", &self.interval)
            .field("max_failures", &self.max_failures)
            .field("monitoring", &self.is_monitoring())
            .finish()
    }
}

async fn poll_loop(
    clipboard: Arc<dyn ClipboardProvider>,
    period: Duration,
    max_failures: u32,
    snapshot: Arc<Mutex<ClipboardSnapshot>>,
    running: Arc<AtomicBool>,
    events: UnboundedSender<MonitorEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut timer = tokio::time::interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failures = 0u32;

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = timer.tick() => {}
        }

        // A slow read must not hold up `stop`
        let read = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            read = clipboard.read_text() => read,
        };

        match read {
            Ok(content) => {
                failures = 0;
                let mut seen = snapshot.lock().await;
                // First read after a fresh start only sets the baseline
                if seen.last_content.is_none() {
                    seen.observe(&content);
                    continue;
                }
                if !seen.observe(&content) {
                    continue;
                }
                drop(seen);

                debug!("Clipboard change detected ({} bytes)", content.len());
                let event = MonitorEvent::Changed {
                    content,
                    detected_at: Local::now(),
                };
                if events.send(event).is_err() {
                    debug!("Clipboard event receiver dropped; stopping poll");
                    break;
                }
            }
            Err(e) => {
                failures += 1;
                warn!(
                    "Clipboard poll failed ({}/{}): {}",
                    failures, max_failures, e
                );
                if failures >= max_failures {
                    running.store(false, Ordering::SeqCst);
                    let degraded = Error::MonitorDegraded {
                        failures,
                        last_error: e.to_string(),
                    };
                    warn!("{}", degraded);
                    if events.send(MonitorEvent::Degraded(degraded)).is_err() {
                        debug!("Clipboard event receiver dropped before degradation notice");
                    }
                    return;
                }
            }
        }
    }

    running.store(false, Ordering::SeqCst);
}
