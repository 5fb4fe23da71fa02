use serde::Deserialize;

// JSON structure for one entry of the `transformations` mapping
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TransformationConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pattern: String,
    pub replacement: String,
    #[serde(default)]
    pub separator: Option<String>,
    #[serde(default)]
    pub join_with: Option<String>,
    #[serde(default)]
    pub skip_empty_lines: bool,
    #[serde(default)]
    pub hotkey: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TransformationConfig {
    /// Multi-line rules are the ones declaring how lines are split or rejoined
    pub fn is_multi_line(&self) -> bool {
        self.separator.is_some() || self.join_with.is_some()
    }
}
