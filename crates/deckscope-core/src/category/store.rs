//! Rule Store
//!
//! Runtime copy of the oracle-text rule table. Starts from the builtin rules
//! and accepts extra patterns from `config.toml`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DeckscopeError, Result};

use super::builtin::{Category, BUILTIN_RULES, DEFAULT_PATTERN_WEIGHT};

/// One oracle-text pattern
#[derive(Debug, Clone, PartialEq)]
pub struct PatternDef {
    pub pattern: String,
    pub weight: f32,
}

/// Ordered patterns for one category
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub category: Category,
    pub patterns: Vec<PatternDef>,
}

/// Runtime rule table
#[derive(Debug, Clone)]
pub struct RuleStore {
    rules: Vec<CategoryRule>,
}

impl RuleStore {
    /// Builtin rules only
    pub fn builtin() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|b| CategoryRule {
                category: b.category,
                patterns: b
                    .patterns
                    .iter()
                    .map(|(pattern, weight)| PatternDef {
                        pattern: pattern.to_string(),
                        weight: *weight,
                    })
                    .collect(),
            })
            .collect();
        Self { rules }
    }

    /// Append configured patterns
    ///
    /// - Patterns for a builtin category run after the builtin ones
    /// - Patterns for `land`/`other` or unknown names are rejected
    pub fn with_config(mut self, config: &CategorizerConfig) -> Result<Self> {
        for (name, patterns) in &config.patterns {
            let category: Category = name.parse()?;
            let extra = patterns.iter().map(|p| PatternDef {
                pattern: p.clone(),
                weight: DEFAULT_PATTERN_WEIGHT,
            });

            match self.rules.iter_mut().find(|r| r.category == category) {
                Some(rule) => rule.patterns.extend(extra),
                None => {
                    return Err(DeckscopeError::InvalidPattern {
                        category: name.clone(),
                        message: "only functional categories take oracle patterns".to_string(),
                    })
                }
            }
        }
        Ok(self)
    }

    pub fn get(&self, category: Category) -> Option<&CategoryRule> {
        self.rules.iter().find(|r| r.category == category)
    }

    /// All rules in evaluation order
    pub fn all(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn pattern_count(&self) -> usize {
        self.rules.iter().map(|r| r.patterns.len()).sum()
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::builtin()
    }
}

/// `[categorizer]` section of `config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategorizerConfig {
    /// Extra regex patterns keyed by category name
    #[serde(default)]
    pub patterns: BTreeMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_store_builtin() {
        let store = RuleStore::builtin();
        assert!(store.get(Category::Ramp).is_some());
        assert!(store.get(Category::Recursion).is_some());
        assert!(store.get(Category::Land).is_none());
    }

    #[test]
    fn test_rule_store_config_appends() {
        let builtin_ramp = RuleStore::builtin()
            .get(Category::Ramp)
            .unwrap()
            .patterns
            .len();

        let config = CategorizerConfig {
            patterns: [(
                "ramp".to_string(),
                vec![r"create.{0,10}Gold token".to_string()],
            )]
            .into_iter()
            .collect(),
        };
        let store = RuleStore::builtin().with_config(&config).unwrap();
        let ramp = store.get(Category::Ramp).unwrap();
        assert_eq!(ramp.patterns.len(), builtin_ramp + 1);
        assert_eq!(ramp.patterns.last().unwrap().weight, DEFAULT_PATTERN_WEIGHT);
        assert_eq!(store.pattern_count(), RuleStore::builtin().pattern_count() + 1);
    }

    #[test]
    fn test_rule_store_config_rejects_land() {
        let config = CategorizerConfig {
            patterns: [("land".to_string(), vec!["Plains".to_string()])]
                .into_iter()
                .collect(),
        };
        assert!(RuleStore::builtin().with_config(&config).is_err());
    }

    #[test]
    fn test_categorizer_config_deserialize() {
        let toml_str = r#"
            [patterns]
            draw = ["investigate"]
        "#;
        let config: CategorizerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.patterns["draw"], vec!["investigate"]);
    }
}
