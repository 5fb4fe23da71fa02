use super::{Session, TextSource};
use crate::clipboard::MonitorEvent;
use crate::error::{Error, Result};
use crate::transform::TransformationEngine;
use tracing::{debug, warn};

/// Outcome of one command line
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub should_continue: bool,
    /// New working text when the command replaced it
    pub updated_text: Option<String>,
}

impl CommandResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            should_continue: true,
            updated_text: None,
        }
    }

    fn updated(message: impl Into<String>, text: String) -> Self {
        Self {
            updated_text: Some(text),
            ..Self::ok(message)
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::ok(message)
        }
    }

    fn quit(message: impl Into<String>) -> Self {
        Self {
            should_continue: false,
            ..Self::ok(message)
        }
    }
}

/// Built-in session commands; these take priority over rule ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinCommand {
    Refresh,
    /// `None` toggles
    Auto(Option<bool>),
    Status,
    Clear,
    Copy,
    Commands,
    Help,
    Quit,
    Show,
    ReloadRules,
}

const BUILTINS: &[(&[&str], &str)] = &[
    (&["refresh", "reload", "r"], "Re-read the clipboard into the working text"),
    (&["auto"], "Toggle clipboard auto-detection (auto on | auto off)"),
    (&["status"], "Show working text length, source and monitor state"),
    (&["clear"], "Empty the working text"),
    (&["copy"], "Copy the working text to the clipboard"),
    (&["show"], "Print the working text"),
    (&["reload-rules"], "Re-read transformation rules from the config file"),
    (&["commands", "cmd"], "List built-in commands"),
    (&["help"], "List available transformations"),
    (&["quit", "q", "exit"], "Leave the session"),
];

impl BuiltinCommand {
    /// Recognize a built-in command, case-insensitively.
    ///
    /// `None` means the line is not a built-in; `Some(Err)` is a built-in with bad arguments.
    pub fn parse(line: &str) -> Option<std::result::Result<Self, String>> {
        let lowered = line.trim().to_lowercase();
        let mut words = lowered.split_whitespace();
        let head = words.next()?;
        let rest: Vec<&str> = words.collect();

        if head == "auto" {
            return Some(match rest.as_slice() {
                [] => Ok(BuiltinCommand::Auto(None)),
                ["on"] => Ok(BuiltinCommand::Auto(Some(true))),
                ["off"] => Ok(BuiltinCommand::Auto(Some(false))),
                _ => Err("Usage: auto [on|off]".to_string()),
            });
        }
        if !rest.is_empty() {
            return None;
        }

        let command = match head {
            "refresh" | "reload" | "r" => BuiltinCommand::Refresh,
            "status" => BuiltinCommand::Status,
            "clear" => BuiltinCommand::Clear,
            "copy" => BuiltinCommand::Copy,
            "commands" | "cmd" => BuiltinCommand::Commands,
            "help" => BuiltinCommand::Help,
            "quit" | "q" | "exit" => BuiltinCommand::Quit,
            "show" => BuiltinCommand::Show,
            "reload-rules" => BuiltinCommand::ReloadRules,
            _ => return None,
        };
        Some(Ok(command))
    }
}

/// Split a rule invocation into ids; `|` and whitespace both separate
fn chain_ids(line: &str) -> Vec<&str> {
    line.split(|c: char| c == '|' || c.is_whitespace())
        .filter(|id| !id.is_empty())
        .collect()
}

/// Interprets command lines against a session and the transformation engine
pub struct CommandProcessor;

impl CommandProcessor {
    pub async fn process_command(
        line: &str,
        session: &mut Session,
        engine: &TransformationEngine,
    ) -> CommandResult {
        let line = line.trim();
        if line.is_empty() {
            return CommandResult::ok("");
        }

        match BuiltinCommand::parse(line) {
            Some(Ok(command)) => Self::run_builtin(command, session, engine).await,
            Some(Err(usage)) => CommandResult::failed(usage),
            None => Self::run_rules(line, session, engine).await,
        }
    }

    async fn run_builtin(
        command: BuiltinCommand,
        session: &mut Session,
        engine: &TransformationEngine,
    ) -> CommandResult {
        debug!("Running built-in command {:?}", command);
        match command {
            BuiltinCommand::Refresh => Self::refresh(session).await,
            BuiltinCommand::Auto(target) => {
                let enabled = target.unwrap_or(!session.state().auto_detection_enabled());
                session.toggle_auto_detection(enabled).await;
                if enabled {
                    CommandResult::ok(format!(
                        "Auto-detection enabled (checking every {:.1}s)",
                        session.settings().auto_detection_interval
                    ))
                } else {
                    CommandResult::ok("Auto-detection disabled")
                }
            }
            BuiltinCommand::Status => CommandResult::ok(session.status_info().to_string()),
            BuiltinCommand::Clear => {
                session
                    .state_mut()
                    .update_working_text(String::new(), TextSource::Manual);
                CommandResult::updated("Working text cleared", String::new())
            }
            BuiltinCommand::Copy => {
                let text = session.state().current_text().to_string();
                match Self::push_to_clipboard(session, &text).await {
                    Ok(()) => CommandResult::ok(format!(
                        "Copied {} chars to clipboard",
                        text.chars().count()
                    )),
                    Err(e) => CommandResult::failed(e.to_string()),
                }
            }
            BuiltinCommand::Commands => CommandResult::ok(Self::commands_text()),
            BuiltinCommand::Help => CommandResult::ok(Self::help_text(engine).await),
            BuiltinCommand::Quit => {
                session.shutdown().await;
                CommandResult::quit("Goodbye")
            }
            BuiltinCommand::Show => {
                let text = session.state().current_text();
                if text.is_empty() {
                    CommandResult::ok("(working text is empty)")
                } else {
                    CommandResult::ok(text)
                }
            }
            BuiltinCommand::ReloadRules => match engine.reload_rules().await {
                Ok(report) => {
                    let mut message = format!("Reloaded {} transformations", report.loaded);
                    for rejected in &report.rejected {
                        message.push_str(&format!("\n  skipped: {}", rejected));
                    }
                    CommandResult::ok(message)
                }
                Err(e) => CommandResult::failed(format!("{} (keeping previous rules)", e)),
            },
        }
    }

    async fn refresh(session: &mut Session) -> CommandResult {
        let check = match session.monitor().check_for_changes().await {
            Ok(check) => check,
            Err(e) => return CommandResult::failed(e.to_string()),
        };

        match Self::accept_external_text(session, check.content.clone(), TextSource::Clipboard) {
            Ok(chars) => {
                let note = if check.changed { "" } else { " (unchanged)" };
                CommandResult::updated(
                    format!("Loaded {} chars from clipboard{}", chars, note),
                    check.content,
                )
            }
            Err(e) => CommandResult::failed(e.to_string()),
        }
    }

    async fn run_rules(
        line: &str,
        session: &mut Session,
        engine: &TransformationEngine,
    ) -> CommandResult {
        let ids = chain_ids(line);
        if ids.is_empty() {
            return Self::unknown_command(line);
        }
        let input = session.state().current_text().to_string();

        let result = match engine.apply_chain(&input, &ids).await {
            Ok(result) => result,
            Err(Error::UnknownRule(id)) if ids.len() == 1 => return Self::unknown_command(&id),
            Err(e) => return CommandResult::failed(e.to_string()),
        };

        session
            .state_mut()
            .update_working_text(result.output.clone(), TextSource::CommandResult);

        let summary = format!(
            "Applied {} ({} -> {} chars)",
            result.rule_id, result.input_length, result.output_length
        );
        let pushed = Self::push_to_clipboard(session, &result.output).await;
        match pushed {
            Ok(()) => CommandResult::updated(
                format!("{}, copied to clipboard", summary),
                result.output,
            ),
            Err(e) => {
                warn!("Transformed text could not be copied: {}", e);
                CommandResult {
                    success: false,
                    ..CommandResult::updated(format!("{}, but {}", summary, e), result.output)
                }
            }
        }
    }

    fn unknown_command(input: &str) -> CommandResult {
        CommandResult::failed(format!(
            "Unknown command or transformation '{}'. Type 'commands' or 'help'.",
            input
        ))
    }

    async fn push_to_clipboard(session: &Session, text: &str) -> Result<()> {
        // Our own write must not come back as an external change
        session.monitor().acknowledge(text).await;
        session.clipboard().write_text(text).await
    }

    /// Replace the working text with externally sourced content, within the size limit.
    ///
    /// Returns the accepted length in characters.
    pub fn accept_external_text(
        session: &mut Session,
        text: String,
        source: TextSource,
    ) -> Result<usize> {
        let limit = session.settings().max_content_size;
        if text.len() > limit {
            return Err(Error::ContentTooLarge {
                size: text.len(),
                limit,
            });
        }

        let chars = text.chars().count();
        session.state_mut().update_working_text(text, source);
        Ok(chars)
    }

    /// Fold one monitor event into the session, returning a notice for the user
    pub async fn handle_monitor_event(
        session: &mut Session,
        event: MonitorEvent,
    ) -> Option<String> {
        match event {
            MonitorEvent::Changed { content, detected_at } => {
                if !session.state().auto_detection_enabled() {
                    debug!("Ignoring clipboard change while auto-detection is off");
                    return None;
                }
                let time = detected_at.format("%H:%M:%S");
                match Self::accept_external_text(session, content, TextSource::Clipboard) {
                    Ok(chars) => Some(format!(
                        "📋 Clipboard changed at {}: loaded {} chars",
                        time, chars
                    )),
                    Err(e) => Some(format!("⚠️ Clipboard change at {} ignored: {}", time, e)),
                }
            }
            MonitorEvent::Degraded(e) => {
                session.toggle_auto_detection(false).await;
                Some(format!("⚠️ {}. Auto-detection disabled; use 'auto on' to retry.", e))
            }
        }
    }

    pub fn commands_text() -> String {
        let mut text = String::from("Built-in commands:");
        for (names, description) in BUILTINS {
            text.push_str(&format!("\n  {:<22} {}", names.join(", "), description));
        }
        text.push_str("\n\nAnything else is run as a transformation; chain them with '|'.");
        text
    }

    pub async fn help_text(engine: &TransformationEngine) -> String {
        let rules = engine.rules().await;
        if rules.is_empty() {
            return "No transformations loaded.".to_string();
        }

        let mut text = String::from("Available transformations:");
        for rule in rules.iter() {
            text.push_str(&format!("\n  {}", rule.id));
            if rule.name != rule.id {
                text.push_str(&format!(" - {}", rule.name));
            }
            if let Some(hotkey) = &rule.hotkey {
                text.push_str(&format!(" [{}]", hotkey));
            }
            if let Some(description) = &rule.description {
                text.push_str(&format!("\n      {}", description));
            }
        }
        text
    }
}
