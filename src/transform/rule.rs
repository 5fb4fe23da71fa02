use crate::config::transformations_config::TransformationConfig;
use crate::error::{Error, Result};
use crate::transform::width::WidthDirection;
use regex::Regex;

// An empty pattern selects the whole text as a single match
const MATCH_ALL_PATTERN: &str = r"(?s)\A.*\z";
const DEFAULT_SEPARATOR: &str = "\n";

/// What replaces each match of a rule's pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    /// Template with `$1` / `${name}` back-references
    Template(String),
    /// Built-in width normalization
    Width(WidthDirection),
}

/// Split/rejoin settings of a multi-line rule
#[derive(Debug, Clone, PartialEq)]
pub struct LineSplit {
    pub separator: String,
    pub join_with: String,
    pub skip_empty_lines: bool,
}

// Compiled structure for runtime use
#[derive(Debug, Clone)]
pub struct TransformationRule {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub hotkey: Option<String>,
    regex: Regex,
    match_all: bool,
    replacement: Replacement,
    lines: Option<LineSplit>,
}

impl TransformationRule {
    pub fn compile(id: &str, config: &TransformationConfig) -> Result<Self> {
        let match_all = config.pattern.is_empty();
        let source = if match_all {
            MATCH_ALL_PATTERN
        } else {
            config.pattern.as_str()
        };
        let regex = Regex::new(source).map_err(|source| Error::RegexCompile {
            rule_id: id.to_string(),
            source,
        })?;

        let replacement = match WidthDirection::from_builtin(&config.replacement) {
            Some(direction) => Replacement::Width(direction),
            None => Replacement::Template(config.replacement.clone()),
        };

        let lines = if config.is_multi_line() {
            let separator = config
                .separator
                .clone()
                .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string());
            if separator.is_empty() {
                return Err(Error::InvalidRule {
                    rule_id: id.to_string(),
                    reason: "separator must not be empty".to_string(),
                });
            }
            Some(LineSplit {
                separator,
                join_with: config
                    .join_with
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
                skip_empty_lines: config.skip_empty_lines,
            })
        } else {
            None
        };

        Ok(Self {
            id: id.to_string(),
            name: config.name.clone().unwrap_or_else(|| id.to_string()),
            description: config.description.clone(),
            hotkey: config.hotkey.clone(),
            regex,
            match_all,
            replacement,
            lines,
        })
    }

    /// Pattern as written in the config (empty for whole-text rules)
    pub fn pattern(&self) -> &str {
        if self.match_all {
            ""
        } else {
            self.regex.as_str()
        }
    }

    pub fn replacement(&self) -> &Replacement {
        &self.replacement
    }

    pub fn line_split(&self) -> Option<&LineSplit> {
        self.lines.as_ref()
    }

    /// Apply this rule to the full text
    pub fn apply(&self, text: &str) -> String {
        match &self.lines {
            Some(split) => split_lines(text, split)
                .into_iter()
                .map(|line| self.substitute(line))
                .collect::<Vec<_>>()
                .join(&split.join_with),
            None => self.substitute(text),
        }
    }

    fn substitute(&self, text: &str) -> String {
        match &self.replacement {
            Replacement::Template(template) => {
                self.regex.replace_all(text, template.as_str()).into_owned()
            }
            Replacement::Width(direction) if self.match_all => direction.apply(text),
            Replacement::Width(direction) => self
                .regex
                .replace_all(text, |caps: &regex::Captures| direction.apply(&caps[0]))
                .into_owned(),
        }
    }
}

/// Split text into lines; empty input has no lines and a trailing
/// separator ends the last line instead of opening a new one.
fn split_lines<'a>(text: &'a str, split: &LineSplit) -> Vec<&'a str> {
    if text.is_empty() {
        return Vec::new();
    }

    let separator = split.separator.as_str();
    let body = text.strip_suffix(separator).unwrap_or(text);
    let mut lines: Vec<&str> = body.split(separator).collect();

    if separator == DEFAULT_SEPARATOR {
        lines = lines
            .into_iter()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
    }

    if split.skip_empty_lines {
        lines.retain(|line| !line.is_empty());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pattern: &str, replacement: &str) -> TransformationConfig {
        TransformationConfig {
            name: None,
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            separator: None,
            join_with: None,
            skip_empty_lines: false,
            hotkey: None,
            description: None,
        }
    }

    fn sql_in_clause() -> TransformationRule {
        let mut config = config("^(.*)$", "'$1'");
        config.separator = Some("\n".to_string());
        config.join_with = Some(",".to_string());
        TransformationRule::compile("sql_in_clause", &config).unwrap()
    }

    #[test]
    fn test_simple_substitution() {
        let rule = TransformationRule::compile("hyphen_to_underscore", &config("-", "_")).unwrap();
        assert_eq!(rule.apply("TOM-QUERY"), "TOM_QUERY");

        let rule = TransformationRule::compile("underscore_to_hyphen", &config("_", "-")).unwrap();
        assert_eq!(rule.apply("TOM_QUERY"), "TOM-QUERY");
    }

    #[test]
    fn test_no_match_returns_input() {
        let rule = TransformationRule::compile("digits", &config(r"\d+", "#")).unwrap();
        assert_eq!(rule.apply("no numbers here"), "no numbers here");
        assert_eq!(rule.apply(""), "");
    }

    #[test]
    fn test_capture_groups() {
        let rule = TransformationRule::compile(
            "swap",
            &config(r"(\w+)@(\w+)", "${2}@${1}"),
        )
        .unwrap();
        assert_eq!(rule.apply("alice@example bob@test"), "example@alice test@bob");
    }

    #[test]
    fn test_named_capture_groups() {
        let rule = TransformationRule::compile(
            "date",
            &config(r"(?P<y>\d{4})-(?P<m>\d{2})-(?P<d>\d{2})", "$d/$m/$y"),
        )
        .unwrap();
        assert_eq!(rule.apply("due 2024-03-15"), "due 15/03/2024");
    }

    #[test]
    fn test_multi_line_join() {
        let rule = sql_in_clause();
        assert_eq!(rule.apply("A\nB\nC"), "'A','B','C'");
    }

    #[test]
    fn test_multi_line_empty_input() {
        assert_eq!(sql_in_clause().apply(""), "");
    }

    #[test]
    fn test_multi_line_trailing_newline_and_crlf() {
        let rule = sql_in_clause();
        assert_eq!(rule.apply("A\r\nB\r\n"), "'A','B'");
    }

    #[test]
    fn test_multi_line_keeps_empty_lines_by_default() {
        assert_eq!(sql_in_clause().apply("A\n\nB"), "'A','','B'");
    }

    #[test]
    fn test_multi_line_skip_empty_lines() {
        let mut config = config("^(.*)$", "'$1'");
        config.join_with = Some(", ".to_string());
        config.skip_empty_lines = true;
        let rule = TransformationRule::compile("quoted", &config).unwrap();

        assert_eq!(rule.apply("A\n\nB\n\n"), "'A', 'B'");
        assert_eq!(rule.apply("\n\n"), "");
    }

    #[test]
    fn test_multi_line_custom_separator_preserves_order() {
        let mut config = config(r"^\s+|\s+$", "");
        config.separator = Some(",".to_string());
        config.join_with = Some("\n".to_string());
        let rule = TransformationRule::compile("commas_to_lines", &config).unwrap();

        assert_eq!(rule.apply("c, a ,b,a"), "c\na\nb\na");
    }

    #[test]
    fn test_width_rules() {
        let narrow = TransformationRule::compile(
            "fullwidth_to_halfwidth",
            &config("", "unicode_normalize_narrow"),
        )
        .unwrap();
        assert_eq!(narrow.apply("港区１ー１"), "港区1-1");
        assert_eq!(narrow.pattern(), "");

        let wide = TransformationRule::compile(
            "halfwidth_to_fullwidth",
            &config("", "unicode_normalize_wide"),
        )
        .unwrap();
        assert_eq!(wide.apply("A1"), "Ａ１");
    }

    #[test]
    fn test_width_rule_limited_to_matches() {
        let rule = TransformationRule::compile(
            "digits_only",
            &config("[０-９]+", "unicode_normalize_narrow"),
        )
        .unwrap();
        assert_eq!(rule.apply("ＡＢ１２３"), "ＡＢ123");
    }

    #[test]
    fn test_match_all_template() {
        let rule = TransformationRule::compile("wrap", &config("", "[$0]")).unwrap();
        assert_eq!(rule.apply("a\nb"), "[a\nb]");
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let err = TransformationRule::compile("broken", &config("[invalid", "x")).unwrap_err();
        match err {
            Error::RegexCompile { rule_id, .. } => assert_eq!(rule_id, "broken"),
            other => panic!("Expected RegexCompile, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_separator_is_rejected() {
        let mut config = config("x", "y");
        config.separator = Some(String::new());
        assert!(matches!(
            TransformationRule::compile("bad_split", &config),
            Err(Error::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_name_defaults_to_id() {
        let rule = TransformationRule::compile("plain", &config("a", "b")).unwrap();
        assert_eq!(rule.name, "plain");
        assert!(rule.line_split().is_none());
        assert_eq!(rule.replacement(), &Replacement::Template("b".to_string()));
    }
}
