pub mod log;
pub mod rule;
pub mod rule_set;
pub mod width;

pub use log::{LogEvent, TransformLog};
pub use rule::{Replacement, TransformationRule};
pub use rule_set::{RuleSet, RuleSetLoad};
pub use width::WidthDirection;

use crate::config::Config;
use crate::error::{Error, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const UNKNOWN_RULE_LABEL: &str = "<unknown>";

/// Output of one successful rule application
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    pub rule_id: String,
    pub output: String,
    pub input_length: usize,
    pub output_length: usize,
    pub elapsed: Duration,
}

/// Summary of a rule set (re)load
#[derive(Debug)]
pub struct ReloadReport {
    pub loaded: usize,
    pub rejected: Vec<Error>,
}

/// Applies named rules from the active rule set.
///
/// The rule set sits behind an `Arc` that is swapped as a whole on reload, so
/// a transformation in flight keeps the set it started with.
#[derive(Debug, Clone)]
pub struct TransformationEngine {
    rules: Arc<RwLock<Arc<RuleSet>>>,
    config_path: Option<PathBuf>,
    log: Option<Arc<TransformLog>>,
}

impl TransformationEngine {
    /// Build an engine from a parsed config; `config_path` is what `reload_rules` re-reads
    pub fn new(config: &Config, config_path: Option<PathBuf>) -> (Self, Vec<Error>) {
        let RuleSetLoad { rule_set, rejected } = RuleSet::from_config(config);
        tracing::info!(
            "Loaded {} transformations ({} rejected)",
            rule_set.len(),
            rejected.len()
        );

        let engine = Self {
            rules: Arc::new(RwLock::new(Arc::new(rule_set))),
            config_path,
            log: None,
        };
        (engine, rejected)
    }

    /// Attach the transformation event log
    pub fn with_log(mut self, log: TransformLog) -> Self {
        self.log = Some(Arc::new(log));
        self
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Snapshot of the active rule set
    pub async fn rules(&self) -> Arc<RuleSet> {
        self.rules.read().await.clone()
    }

    /// Rule ids in load order
    pub async fn available_transformations(&self) -> Vec<String> {
        self.rules().await.ids()
    }

    pub async fn apply_transformation(&self, text: &str, rule_id: &str) -> Result<TransformResult> {
        let rules = self.rules().await;
        self.apply_with(&rules, text, rule_id)
    }

    /// Apply rules left to right, each on the previous output
    pub async fn apply_chain(&self, text: &str, rule_ids: &[&str]) -> Result<TransformResult> {
        let rules = self.rules().await;
        let mut current = text.to_string();
        let mut last = None;

        for rule_id in rule_ids {
            let result = self.apply_with(&rules, &current, rule_id)?;
            current = result.output.clone();
            last = Some(result);
        }

        last.map(|result| TransformResult {
            rule_id: rule_ids.join(" | "),
            input_length: text.chars().count(),
            ..result
        })
        .ok_or_else(|| Error::UnknownRule("<empty chain>".to_string()))
    }

    fn apply_with(&self, rules: &RuleSet, text: &str, rule_id: &str) -> Result<TransformResult> {
        let started = Instant::now();
        let input_length = text.chars().count();

        let Some(rule) = rules.find(rule_id) else {
            // Whatever was typed may be pasted text; keep it out of the log
            self.record(
                UNKNOWN_RULE_LABEL,
                input_length,
                0,
                started.elapsed(),
                Some("unknown transformation rule"),
            );
            return Err(Error::UnknownRule(rule_id.to_string()));
        };

        let output = rule.apply(text);
        let output_length = output.chars().count();
        let elapsed = started.elapsed();

        tracing::debug!(
            "Applied '{}': {} -> {} chars in {:?}",
            rule.id,
            input_length,
            output_length,
            elapsed
        );
        self.record(&rule.id, input_length, output_length, elapsed, None);

        Ok(TransformResult {
            rule_id: rule.id.clone(),
            output,
            input_length,
            output_length,
            elapsed,
        })
    }

    fn record(
        &self,
        rule_id: &str,
        input_length: usize,
        output_length: usize,
        elapsed: Duration,
        error: Option<&str>,
    ) {
        let Some(log) = &self.log else {
            return;
        };

        let event = LogEvent {
            timestamp: Local::now(),
            transformation: rule_id.to_string(),
            input_length,
            output_length,
            success: error.is_none(),
            error_message: error.map(str::to_string),
            execution_time_ms: elapsed.as_secs_f64() * 1000.0,
        };
        if let Err(e) = log.record(&event) {
            tracing::warn!(
                "Failed to write transformation log {}: {}",
                log.path().display(),
                e
            );
        }
    }

    /// Re-read the config document and swap in its rules.
    ///
    /// On error the current rule set stays active.
    pub async fn reload_rules(&self) -> Result<ReloadReport> {
        let path = self
            .config_path
            .as_deref()
            .ok_or_else(|| Error::config_parse("<none>", "engine has no config document"))?;

        let config = Config::from_file(path)?;
        let report = self.replace_rules(&config).await;
        tracing::info!(
            "Reloaded {} transformations from {}",
            report.loaded,
            path.display()
        );
        Ok(report)
    }

    /// Compile a config and atomically make it the active rule set
    pub async fn replace_rules(&self, config: &Config) -> ReloadReport {
        let RuleSetLoad { rule_set, rejected } = RuleSet::from_config(config);
        let loaded = rule_set.len();

        *self.rules.write().await = Arc::new(rule_set);

        ReloadReport { loaded, rejected }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const CONFIG: &str = r#"{
        "transformations": {
            "hyphen_to_underscore": { "name": "Hyphen to underscore", "pattern": "-", "replacement": "_" },
            "underscore_to_hyphen": { "pattern": "_", "replacement": "-" },
            "sql_in_clause": { "pattern": "^(.*)$", "replacement": "'$1'", "separator": "\n", "join_with": "," },
            "fullwidth_to_halfwidth": { "pattern": "", "replacement": "unicode_normalize_narrow" },
            "halfwidth_to_fullwidth": { "pattern": "", "replacement": "unicode_normalize_wide" }
        }
    }"#;

    fn engine_from_file() -> (TransformationEngine, NamedTempFile) {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", CONFIG).unwrap();
        let config = Config::from_file(file.path()).unwrap();
        let (engine, rejected) =
            TransformationEngine::new(&config, Some(file.path().to_path_buf()));
        assert!(rejected.is_empty());
        (engine, file)
    }

    #[tokio::test]
    async fn test_apply_known_rules() {
        let (engine, _file) = engine_from_file();

        let result = engine
            .apply_transformation("TOM-QUERY", "hyphen_to_underscore")
            .await
            .unwrap();
        assert_eq!(result.output, "TOM_QUERY");
        assert_eq!(result.input_length, 9);
        assert_eq!(result.output_length, 9);

        let result = engine
            .apply_transformation("TOM_QUERY", "underscore_to_hyphen")
            .await
            .unwrap();
        assert_eq!(result.output, "TOM-QUERY");

        let result = engine
            .apply_transformation("港区１ー１", "fullwidth_to_halfwidth")
            .await
            .unwrap();
        assert_eq!(result.output, "港区1-1");

        let result = engine
            .apply_transformation("A\nB\nC", "sql_in_clause")
            .await
            .unwrap();
        assert_eq!(result.output, "'A','B','C'");
    }

    #[tokio::test]
    async fn test_unknown_rule() {
        let (engine, _file) = engine_from_file();
        let err = engine
            .apply_transformation("text", "does_not_exist")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownRule(ref id) if id == "does_not_exist"));
    }

    #[tokio::test]
    async fn test_available_transformations_in_load_order() {
        let (engine, _file) = engine_from_file();
        assert_eq!(
            engine.available_transformations().await,
            vec![
                "hyphen_to_underscore",
                "underscore_to_hyphen",
                "sql_in_clause",
                "fullwidth_to_halfwidth",
                "halfwidth_to_fullwidth"
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_chain() {
        let (engine, _file) = engine_from_file();
        let result = engine
            .apply_chain(
                "ＴＯＭ－ＱＵＥＲＹ",
                &["fullwidth_to_halfwidth", "hyphen_to_underscore"],
            )
            .await
            .unwrap();
        assert_eq!(result.output, "TOM_QUERY");
        assert_eq!(result.rule_id, "fullwidth_to_halfwidth | hyphen_to_underscore");

        let err = engine
            .apply_chain("x", &["hyphen_to_underscore", "missing"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownRule(_)));
    }

    #[tokio::test]
    async fn test_wide_of_narrow_idempotent_through_engine() {
        let (engine, _file) = engine_from_file();
        let apply_both = |text: String| {
            let engine = engine.clone();
            async move {
                let narrow = engine
                    .apply_transformation(&text, "fullwidth_to_halfwidth")
                    .await
                    .unwrap();
                engine
                    .apply_transformation(&narrow.output, "halfwidth_to_fullwidth")
                    .await
                    .unwrap()
                    .output
            }
        };

        let once = apply_both("SELECT * FROM t-1;".to_string()).await;
        let twice = apply_both(once.clone()).await;
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_malformed_reload_keeps_previous_rules() {
        let (engine, file) = engine_from_file();
        let before = engine.available_transformations().await;

        std::fs::write(file.path(), "{ \"transformations\": { broken").unwrap();
        let err = engine.reload_rules().await.unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));

        assert_eq!(engine.available_transformations().await, before);
        let result = engine
            .apply_transformation("a-b", "hyphen_to_underscore")
            .await
            .unwrap();
        assert_eq!(result.output, "a_b");
    }

    #[tokio::test]
    async fn test_reload_swaps_rule_set() {
        let (engine, file) = engine_from_file();

        std::fs::write(
            file.path(),
            r#"{ "transformations": {
                "shout": { "pattern": "(?s).+", "replacement": "$0!" },
                "bad": { "pattern": "(", "replacement": "" }
            } }"#,
        )
        .unwrap();

        let report = engine.reload_rules().await.unwrap();
        assert_eq!(report.loaded, 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(engine.available_transformations().await, vec!["shout"]);
        assert!(engine
            .apply_transformation("x", "hyphen_to_underscore")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_reload_without_config_path() {
        let config = Config::parse(CONFIG, Path::new("inline")).unwrap();
        let (engine, _) = TransformationEngine::new(&config, None);
        assert!(engine.reload_rules().await.is_err());
        assert_eq!(engine.available_transformations().await.len(), 5);
    }

    #[tokio::test]
    async fn test_events_logged_without_text() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("transformations.log");
        let config = Config::parse(CONFIG, Path::new("inline")).unwrap();
        let (engine, _) = TransformationEngine::new(&config, None);
        let engine = engine.with_log(TransformLog::open(&log_path).unwrap());

        engine
            .apply_transformation("secret-value", "hyphen_to_underscore")
            .await
            .unwrap();
        let _ = engine
            .apply_transformation("secret-value", "password=hunter2")
            .await;

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(!content.contains("secret"));
        assert!(!content.contains("hunter2"));

        let events: Vec<LogEvent> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert!(events[0].success);
        assert_eq!(events[0].input_length, 12);
        assert!(!events[1].success);
        assert_eq!(events[1].transformation, "<unknown>");
        assert_eq!(
            events[1].error_message.as_deref(),
            Some("unknown transformation rule")
        );
    }
}
