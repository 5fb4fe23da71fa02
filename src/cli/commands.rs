use super::args::{ApplyArgs, InteractiveArgs};
use anyhow::{Context, Result};
use clip_rules::clipboard::{ClipboardProvider, MemoryClipboard, SystemClipboard};
use clip_rules::config::{default_config_path, Config};
use clip_rules::hotkey::{find_conflicts, hotkey_bindings, RuleInvoker};
use clip_rules::session::{InteractiveSession, Session};
use clip_rules::transform::{Replacement, TransformLog, TransformationEngine};
use clip_rules::watcher::ConfigWatcher;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncReadExt, BufReader};

/// Load the config document and build the engine with its event log
pub fn load_engine(config_path: Option<PathBuf>) -> Result<(Config, TransformationEngine)> {
    let path = config_path.unwrap_or_else(default_config_path);
    let config = Config::from_file(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    let (mut engine, rejected) = TransformationEngine::new(&config, Some(path));
    for error in &rejected {
        eprintln!("⚠️ Skipping rule: {}", error);
    }

    if let Some(log_path) = config.logging.log_path() {
        match TransformLog::open(&log_path) {
            Ok(log) => engine = engine.with_log(log),
            Err(e) => tracing::warn!(
                "Transformation log {} unavailable: {}",
                log_path.display(),
                e
            ),
        }
    }

    Ok((config, engine))
}

/// Read at most `limit + 1` bytes so oversized input is still rejected by the size check
async fn read_capped<R: AsyncRead + Unpin>(reader: R, limit: usize) -> Result<String> {
    let mut bytes = Vec::new();
    reader
        .take(limit.saturating_add(1) as u64)
        .read_to_end(&mut bytes)
        .await?;

    if bytes.len() > limit {
        // The cut may land inside a character; the text is only measured from here on
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }
    String::from_utf8(bytes).context("Input is not valid UTF-8")
}

fn system_clipboard() -> Result<Arc<dyn ClipboardProvider>> {
    let clipboard = SystemClipboard::detect().context("Clipboard is not available")?;
    tracing::debug!("Clipboard backend: {}", clipboard.backend());
    Ok(Arc::new(clipboard))
}

/// Run the interactive session (default mode when no subcommand is provided)
pub async fn run_interactive(config_path: Option<PathBuf>, args: &InteractiveArgs) -> Result<()> {
    let (config, engine) = load_engine(config_path)?;
    let clipboard = system_clipboard()?;
    let limit = config.interactive_mode.clipboard_refresh.max_content_size;

    let _watcher = if args.watch {
        Some(ConfigWatcher::new(engine.clone())?)
    } else {
        None
    };

    // Piped stdin becomes the working text; commands then come from the terminal
    let (piped, input): (Option<String>, Box<dyn AsyncBufRead + Unpin + Send>) =
        if std::io::stdin().is_terminal() {
            (None, Box::new(BufReader::new(tokio::io::stdin())))
        } else {
            let text = read_capped(tokio::io::stdin(), limit)
                .await
                .context("Failed to read piped input")?;
            let tty = tokio::fs::File::open("/dev/tty")
                .await
                .context("stdin is piped and no terminal is available for commands")?;
            (Some(text), Box::new(BufReader::new(tty)))
        };

    let settings = config.interactive_mode.clipboard_refresh.clone();
    let mut interactive = InteractiveSession::new(Session::new(clipboard, settings), engine);
    interactive.initialize(piped).await;

    let mut stdout = std::io::stdout();
    interactive
        .run(input, &mut stdout)
        .await
        .context("Interactive session failed")?;
    Ok(())
}

/// Apply rules once, to the clipboard or to stdin
pub async fn handle_apply_command(config_path: Option<PathBuf>, args: &ApplyArgs) -> Result<()> {
    let (config, engine) = load_engine(config_path)?;
    let rule_ids: Vec<&str> = args.rules.iter().map(String::as_str).collect();
    let limit = config.interactive_mode.clipboard_refresh.max_content_size;

    if args.stdin {
        let text = read_capped(tokio::io::stdin(), limit)
            .await
            .context("Failed to read stdin")?;
        let buffer = Arc::new(MemoryClipboard::with_text(&text));
        let invoker = RuleInvoker::new(engine, buffer.clone(), limit);
        invoker.invoke_chain(&rule_ids).await?;
        print!("{}", buffer.text());
        return Ok(());
    }

    let invoker = RuleInvoker::new(engine, system_clipboard()?, limit);
    let result = invoker.invoke_chain(&rule_ids).await?;
    println!(
        "✅ Applied {} to clipboard ({} -> {} chars)",
        result.rule_id, result.input_length, result.output_length
    );
    Ok(())
}

/// Handle list command
pub async fn handle_list_command(config_path: Option<PathBuf>) -> Result<()> {
    let (_, engine) = load_engine(config_path)?;
    let rules = engine.rules().await;

    if let Some(path) = engine.config_path() {
        println!("📂 Config file: {}", path.display());
    }
    println!("Loaded {} transformations", rules.len());

    for rule in rules.iter() {
        let replacement = match rule.replacement() {
            Replacement::Template(template) => format!("{:?}", template),
            Replacement::Width(direction) => direction.builtin_name().to_string(),
        };
        println!("\n  {}: {}", rule.id, rule.name);
        println!("    pattern: {:?} -> {}", rule.pattern(), replacement);
        if let Some(lines) = rule.line_split() {
            println!(
                "    lines: split {:?}, join {:?}{}",
                lines.separator,
                lines.join_with,
                if lines.skip_empty_lines { ", skip empty" } else { "" }
            );
        }
        if let Some(description) = &rule.description {
            println!("    {}", description);
        }
    }
    Ok(())
}

/// Handle hotkeys command
pub async fn handle_hotkeys_command(config_path: Option<PathBuf>) -> Result<()> {
    let (_, engine) = load_engine(config_path)?;
    let bindings = hotkey_bindings(&engine).await;

    if bindings.is_empty() {
        println!("No hotkeys declared");
        return Ok(());
    }

    for binding in &bindings {
        println!("  {:<20} {}", binding.combo, binding.rule_id);
    }
    for conflict in find_conflicts(&bindings) {
        println!(
            "⚠️ {} is declared by {}",
            conflict.combo,
            conflict.rule_ids.join(", ")
        );
    }
    Ok(())
}
