//! Hotkey bindings declared by rules, and the callbacks a global hotkey
//! registrar binds to them.

use crate::clipboard::ClipboardProvider;
use crate::error::{Error, Result};
use crate::transform::{TransformResult, TransformationEngine};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{info, warn};

/// A rule's declared shortcut
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBinding {
    /// Normalized combo, e.g. `cmd+shift+u`
    pub combo: String,
    pub rule_id: String,
}

/// Several rules declaring the same combo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyConflict {
    pub combo: String,
    pub rule_ids: Vec<String>,
}

/// Lowercase and sort modifiers so `Shift+Cmd+U` equals `cmd+shift+u`
pub fn normalize_combo(combo: &str) -> String {
    let mut keys: Vec<String> = combo
        .split('+')
        .map(|key| key.trim().to_lowercase())
        .filter(|key| !key.is_empty())
        .collect();
    let Some(key) = keys.pop() else {
        return String::new();
    };
    keys.sort();
    keys.dedup();
    keys.push(key);
    keys.join("+")
}

/// Bindings of the active rule set, in rule load order
pub async fn hotkey_bindings(engine: &TransformationEngine) -> Vec<HotkeyBinding> {
    engine
        .rules()
        .await
        .iter()
        .filter_map(|rule| {
            let combo = normalize_combo(rule.hotkey.as_deref()?);
            (!combo.is_empty()).then(|| HotkeyBinding {
                combo,
                rule_id: rule.id.clone(),
            })
        })
        .collect()
}

/// Combos bound to more than one rule, sorted by combo
pub fn find_conflicts(bindings: &[HotkeyBinding]) -> Vec<HotkeyConflict> {
    let mut by_combo: HashMap<&str, Vec<String>> = HashMap::new();
    for binding in bindings {
        by_combo
            .entry(binding.combo.as_str())
            .or_default()
            .push(binding.rule_id.clone());
    }

    let mut conflicts: Vec<HotkeyConflict> = by_combo
        .into_iter()
        .filter(|(_, rule_ids)| rule_ids.len() > 1)
        .map(|(combo, rule_ids)| HotkeyConflict {
            combo: combo.to_string(),
            rule_ids,
        })
        .collect();
    conflicts.sort_by(|a, b| a.combo.cmp(&b.combo));
    conflicts
}

pub type HotkeyFuture = Pin<Box<dyn Future<Output = Result<TransformResult>> + Send>>;
pub type HotkeyCallback = Box<dyn Fn() -> HotkeyFuture + Send + Sync>;

/// Runs one rule against the clipboard: read, transform, write back
#[derive(Clone)]
pub struct RuleInvoker {
    engine: TransformationEngine,
    clipboard: Arc<dyn ClipboardProvider>,
    max_content_size: usize,
}

impl RuleInvoker {
    pub fn new(
        engine: TransformationEngine,
        clipboard: Arc<dyn ClipboardProvider>,
        max_content_size: usize,
    ) -> Self {
        Self {
            engine,
            clipboard,
            max_content_size,
        }
    }

    pub async fn invoke(&self, rule_id: &str) -> Result<TransformResult> {
        self.invoke_chain(&[rule_id]).await
    }

    /// Like `invoke`, applying several rules left to right
    pub async fn invoke_chain(&self, rule_ids: &[&str]) -> Result<TransformResult> {
        let text = self.clipboard.read_text().await?;
        if text.len() > self.max_content_size {
            return Err(Error::ContentTooLarge {
                size: text.len(),
                limit: self.max_content_size,
            });
        }

        let result = match rule_ids {
            [rule_id] => self.engine.apply_transformation(&text, rule_id).await?,
            _ => self.engine.apply_chain(&text, rule_ids).await?,
        };
        self.clipboard.write_text(&result.output).await?;
        info!(
            "Applied '{}' to clipboard ({} -> {} chars)",
            result.rule_id, result.input_length, result.output_length
        );
        Ok(result)
    }

    /// Owned callback for one rule, suitable for a registrar to keep
    pub fn callback(&self, rule_id: &str) -> HotkeyCallback {
        let invoker = self.clone();
        let rule_id = rule_id.to_string();
        Box::new(move || {
            let invoker = invoker.clone();
            let rule_id = rule_id.clone();
            Box::pin(async move { invoker.invoke(&rule_id).await })
        })
    }
}

/// Platform facility that binds global shortcuts
pub trait HotkeyRegistrar {
    fn register(&mut self, combo: &str, callback: HotkeyCallback) -> Result<()>;
}

/// Register every binding, skipping combos claimed by several rules.
///
/// Returns the number registered.
pub fn register_all(
    registrar: &mut dyn HotkeyRegistrar,
    invoker: &RuleInvoker,
    bindings: &[HotkeyBinding],
) -> usize {
    let conflicts = find_conflicts(bindings);
    for conflict in &conflicts {
        warn!(
            "Hotkey {} is declared by several rules ({}); not binding it",
            conflict.combo,
            conflict.rule_ids.join(", ")
        );
    }

    let mut registered = 0;
    for binding in bindings {
        if conflicts.iter().any(|c| c.combo == binding.combo) {
            continue;
        }
        match registrar.register(&binding.combo, invoker.callback(&binding.rule_id)) {
            Ok(()) => registered += 1,
            Err(e) => warn!("Failed to bind {} to '{}': {}", binding.combo, binding.rule_id, e),
        }
    }
    registered
}
