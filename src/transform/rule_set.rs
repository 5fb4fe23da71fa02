use crate::config::Config;
use crate::error::Error;
use crate::transform::rule::TransformationRule;
use std::collections::HashMap;

/// Ordered, immutable collection of compiled rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<TransformationRule>,
    index: HashMap<String, usize>,
}

/// Outcome of compiling a config document into a rule set
#[derive(Debug)]
pub struct RuleSetLoad {
    pub rule_set: RuleSet,
    /// Rules that were excluded, with the reason
    pub rejected: Vec<Error>,
}

impl RuleSet {
    /// Compile every rule of the document, excluding the ones that fail
    pub fn from_config(config: &Config) -> RuleSetLoad {
        let mut rule_set = RuleSet::default();
        let mut rejected = Vec::new();

        for (id, entry) in config.transformation_entries() {
            let compiled = entry
                .map_err(|e| Error::InvalidRule {
                    rule_id: id.to_string(),
                    reason: e.to_string(),
                })
                .and_then(|definition| TransformationRule::compile(id, &definition));

            match compiled {
                Ok(rule) => rule_set.push(rule),
                Err(e) => {
                    tracing::warn!("Excluding transformation '{}': {}", id, e);
                    rejected.push(e);
                }
            }
        }

        RuleSetLoad { rule_set, rejected }
    }

    fn push(&mut self, rule: TransformationRule) {
        match self.index.get(&rule.id) {
            Some(&position) => self.rules[position] = rule,
            None => {
                self.index.insert(rule.id.clone(), self.rules.len());
                self.rules.push(rule);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&TransformationRule> {
        self.index.get(id).map(|&position| &self.rules[position])
    }

    /// Exact lookup first, then a case-insensitive match
    pub fn find(&self, id: &str) -> Option<&TransformationRule> {
        self.get(id).or_else(|| {
            self.rules
                .iter()
                .find(|rule| rule.id.eq_ignore_ascii_case(id))
        })
    }

    pub fn ids(&self) -> Vec<String> {
        self.rules.iter().map(|rule| rule.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransformationRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
