use super::command::CommandProcessor;
use super::{CommandResult, Session, TextSource};
use crate::error::Result;
use crate::transform::TransformationEngine;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

const PROMPT: &str = "clip> ";

/// Line-oriented front end over a `Session`
pub struct InteractiveSession {
    session: Session,
    engine: TransformationEngine,
    notices: Vec<String>,
}

impl InteractiveSession {
    pub fn new(session: Session, engine: TransformationEngine) -> Self {
        Self {
            session,
            engine,
            notices: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Seed the working text and start auto-detection if configured.
    ///
    /// Piped text wins over the clipboard; a clipboard that cannot be read
    /// leaves the session empty with a notice.
    pub async fn initialize(&mut self, piped: Option<String>) {
        match piped {
            Some(text) => match CommandProcessor::accept_external_text(
                &mut self.session,
                text,
                TextSource::Pipe,
            ) {
                Ok(chars) => self.notices.push(format!("📥 Read {} chars from stdin", chars)),
                Err(e) => self.notices.push(format!("⚠️ Ignoring piped input: {}", e)),
            },
            None => match self.session.monitor().check_for_changes().await {
                Ok(check) => {
                    match CommandProcessor::accept_external_text(
                        &mut self.session,
                        check.content,
                        TextSource::Clipboard,
                    ) {
                        Ok(chars) => {
                            self.notices.push(format!("📋 Loaded {} chars from clipboard", chars))
                        }
                        Err(e) => self.notices.push(format!("⚠️ Clipboard not loaded: {}", e)),
                    }
                }
                Err(e) => self.notices.push(format!("⚠️ {}", e)),
            },
        }

        if self.session.settings().enable_auto_detection_by_default {
            self.session.toggle_auto_detection(true).await;
            self.notices.push("🔄 Auto-detection is on".to_string());
        }
    }

    /// Read and execute commands until `quit` or end of input.
    ///
    /// The monitor is stopped before this returns, on every path.
    pub async fn run<R, W>(&mut self, input: R, output: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let outcome = self.command_loop(input, output).await;
        self.session.shutdown().await;
        info!("Interactive session ended");
        outcome
    }

    async fn command_loop<R, W>(&mut self, input: R, output: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        writeln!(output, "🎯 clip-rules interactive mode. Type 'commands' for help.")?;
        self.render_status(output)?;

        loop {
            self.drain_monitor_events().await;
            self.render_notices(output)?;
            write!(output, "{}", PROMPT)?;
            output.flush()?;

            let Some(line) = lines.next_line().await? else {
                debug!("End of input");
                writeln!(output)?;
                break;
            };

            // Pick up changes detected while waiting for the line
            self.drain_monitor_events().await;
            self.render_notices(output)?;

            let result =
                CommandProcessor::process_command(&line, &mut self.session, &self.engine).await;
            self.render_result(output, &result)?;
            if !result.should_continue {
                break;
            }
        }
        Ok(())
    }

    async fn drain_monitor_events(&mut self) {
        for event in self.session.monitor_mut().drain_events() {
            let notice = CommandProcessor::handle_monitor_event(&mut self.session, event).await;
            if let Some(notice) = notice {
                self.notices.push(notice);
            }
        }
    }

    fn render_notices<W: Write>(&mut self, output: &mut W) -> Result<()> {
        let imported = !self.notices.is_empty();
        for notice in self.notices.drain(..) {
            writeln!(output, "{}", notice)?;
        }
        if imported {
            self.render_status(output)?;
        }
        Ok(())
    }

    fn render_result<W: Write>(&self, output: &mut W, result: &CommandResult) -> Result<()> {
        if !result.message.is_empty() {
            let marker = if result.success { "✅" } else { "❌" };
            writeln!(output, "{} {}", marker, result.message)?;
        }
        if result.updated_text.is_some() {
            self.render_status(output)?;
        }
        Ok(())
    }

    fn render_status<W: Write>(&self, output: &mut W) -> Result<()> {
        let settings = self.session.settings();
        let status = self.session.status_info();

        let mut parts = Vec::new();
        if settings.show_character_count {
            parts.push(format!("{} chars", status.text_length));
        }
        parts.push(format!("from {}", status.text_source));
        if settings.show_timestamps {
            parts.push(status.last_update_time.format("%H:%M:%S").to_string());
        }
        if status.auto_detection_enabled {
            parts.push("auto".to_string());
        }
        writeln!(output, "📝 [{}]", parts.join(" | "))?;
        Ok(())
    }
}
