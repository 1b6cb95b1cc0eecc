use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::category::CategorizerConfig;
use crate::error::{DeckscopeError, Result};
use crate::llm::LlmConfig;

const CONFIG_FILE: &str = "config.toml";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# deckscope configuration file
# Location: ~/.deckscope/config.toml

[analysis]
# Minimum number of decks a card must appear in to be listed as a staple
min_appearances = 2

# Maximum number of staples listed
top_cards_limit = 50

# Minimum pairwise Jaccard similarity inside a package
package_threshold = 0.7

# Smallest package reported
package_min_cards = 3

# Fraction of decks a card must appear in to be considered for packages
package_min_presence = 0.3

# Cards in nearly every deck, never part of a package
auto_includes = ["Sol Ring", "Command Tower", "Arcane Signet"]

# Minimum play-rate difference (0-1) reported by bracket comparison
bracket_diff_threshold = 0.2

# Cards listed per side in bracket comparison
bracket_diff_limit = 20

# Ramp cards listed per commander mana value
ramp_top_cards = 20

# Spells listed per curve bucket in the cost/curve report
top_spells_per_bucket = 8

[llm]
# Send cards the rules leave as "other" to the claude CLI after import
enabled = false

# Cards per prompt
batch_size = 20

[categorizer.patterns]
# Extra case-insensitive oracle-text patterns per category
# Example: ramp = ["create.{0,10}Gold token"]
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub categorizer: CategorizerConfig,
}

/// Tunables for the analysis reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub min_appearances: u32,
    pub top_cards_limit: usize,
    pub package_threshold: f64,
    pub package_min_cards: usize,
    pub package_min_presence: f64,
    pub auto_includes: Vec<String>,
    pub bracket_diff_threshold: f64,
    pub bracket_diff_limit: usize,
    pub ramp_top_cards: usize,
    pub top_spells_per_bucket: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_appearances: 2,
            top_cards_limit: 50,
            package_threshold: 0.7,
            package_min_cards: 3,
            package_min_presence: 0.3,
            auto_includes: ["Sol Ring", "Command Tower", "Arcane Signet"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            bracket_diff_threshold: 0.2,
            bracket_diff_limit: 20,
            ramp_top_cards: 20,
            top_spells_per_bucket: 8,
        }
    }
}

const KEYS: &[&str] = &[
    "analysis.min_appearances",
    "analysis.top_cards_limit",
    "analysis.package_threshold",
    "analysis.package_min_cards",
    "analysis.package_min_presence",
    "analysis.auto_includes",
    "analysis.bracket_diff_threshold",
    "analysis.bracket_diff_limit",
    "analysis.ramp_top_cards",
    "analysis.top_spells_per_bucket",
    "llm.enabled",
    "llm.batch_size",
];

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = Self::path(base_dir);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| DeckscopeError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = Self::path(base_dir);
        fs::create_dir_all(base_dir)?;
        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Write the commented template unless a config already exists
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = Self::path(base_dir);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        let a = &self.analysis;
        let value = match key {
            "analysis.min_appearances" => a.min_appearances.to_string(),
            "analysis.top_cards_limit" => a.top_cards_limit.to_string(),
            "analysis.package_threshold" => a.package_threshold.to_string(),
            "analysis.package_min_cards" => a.package_min_cards.to_string(),
            "analysis.package_min_presence" => a.package_min_presence.to_string(),
            "analysis.auto_includes" => format!("{:?}", a.auto_includes),
            "analysis.bracket_diff_threshold" => a.bracket_diff_threshold.to_string(),
            "analysis.bracket_diff_limit" => a.bracket_diff_limit.to_string(),
            "analysis.ramp_top_cards" => a.ramp_top_cards.to_string(),
            "analysis.top_spells_per_bucket" => a.top_spells_per_bucket.to_string(),
            "llm.enabled" => self.llm.enabled.to_string(),
            "llm.batch_size" => self.llm.batch_size.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let a = &mut self.analysis;
        match key {
            "analysis.min_appearances" => a.min_appearances = parse_number(key, value)?,
            "analysis.top_cards_limit" => a.top_cards_limit = parse_number(key, value)?,
            "analysis.package_threshold" => a.package_threshold = parse_ratio(key, value)?,
            "analysis.package_min_cards" => a.package_min_cards = parse_number(key, value)?,
            "analysis.package_min_presence" => a.package_min_presence = parse_ratio(key, value)?,
            "analysis.auto_includes" => a.auto_includes = parse_string_list(value),
            "analysis.bracket_diff_threshold" => {
                a.bracket_diff_threshold = parse_ratio(key, value)?
            }
            "analysis.bracket_diff_limit" => a.bracket_diff_limit = parse_number(key, value)?,
            "analysis.ramp_top_cards" => a.ramp_top_cards = parse_number(key, value)?,
            "analysis.top_spells_per_bucket" => a.top_spells_per_bucket = parse_number(key, value)?,
            "llm.enabled" => self.llm.enabled = parse_bool(key, value)?,
            "llm.batch_size" => {
                let size: usize = parse_number(key, value)?;
                if size == 0 {
                    return Err(DeckscopeError::ConfigValue {
                        key: key.to_string(),
                        message: "must be at least 1".to_string(),
                    });
                }
                self.llm.batch_size = size;
            }
            _ => {
                return Err(DeckscopeError::ConfigKeyNotFound {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        KEYS.iter()
            .filter_map(|key| self.get(key).map(|value| (key.to_string(), value)))
            .collect()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| DeckscopeError::ConfigValue {
        key: key.to_string(),
        message: format!("expected a non-negative integer, got '{}'", value),
    })
}

fn parse_ratio(key: &str, value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) if (0.0..=1.0).contains(&v) => Ok(v),
        _ => Err(DeckscopeError::ConfigValue {
            key: key.to_string(),
            message: format!("expected a number between 0 and 1, got '{}'", value),
        }),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(DeckscopeError::ConfigValue {
            key: key.to_string(),
            message: format!("expected true or false, got '{}'", value),
        }),
    }
}

/// Parse a comma-separated or JSON-like list string
fn parse_string_list(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    inner
        .split(',')
        .map(|s| s.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_string_list() {
        assert_eq!(parse_string_list("Sol Ring, Mana Crypt"), vec!["Sol Ring", "Mana Crypt"]);
        assert_eq!(
            parse_string_list(r#"["Sol Ring", "Arcane Signet"]"#),
            vec!["Sol Ring", "Arcane Signet"]
        );
        assert!(parse_string_list("[]").is_empty());
    }

    #[test]
    fn test_config_get_set() {
        let mut config = Config::default();

        config.set("analysis.min_appearances", "3").unwrap();
        assert_eq!(config.analysis.min_appearances, 3);
        assert_eq!(config.get("analysis.min_appearances").unwrap(), "3");

        config.set("llm.enabled", "yes").unwrap();
        assert!(config.llm.enabled);
    }

    #[test]
    fn test_config_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(matches!(
            config.set("analysis.package_threshold", "1.5"),
            Err(DeckscopeError::ConfigValue { .. })
        ));
        assert!(matches!(
            config.set("llm.batch_size", "0"),
            Err(DeckscopeError::ConfigValue { .. })
        ));
        assert!(matches!(
            config.set("nope.key", "1"),
            Err(DeckscopeError::ConfigKeyNotFound { .. })
        ));
    }

    #[test]
    fn test_list_covers_every_key() {
        let config = Config::default();
        assert_eq!(config.list().len(), KEYS.len());
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = Config::init(tmp.path()).unwrap();
        assert!(path.exists());

        let config = Config::load(tmp.path()).unwrap();
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert!(!config.llm.enabled);
        assert!(config.categorizer.patterns.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.set("analysis.auto_includes", "Sol Ring").unwrap();
        config
            .categorizer
            .patterns
            .insert("draw".to_string(), vec!["investigate".to_string()]);
        config.save(tmp.path()).unwrap();

        let loaded = Config::load(tmp.path()).unwrap();
        assert_eq!(loaded.analysis.auto_includes, vec!["Sol Ring"]);
        assert_eq!(loaded.categorizer.patterns["draw"], vec!["investigate"]);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load(tmp.path()).unwrap();
        assert_eq!(config.analysis.top_cards_limit, 50);
    }

    #[test]
    fn test_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(Config::path(tmp.path()), "[analysis\n").unwrap();
        assert!(matches!(
            Config::load(tmp.path()),
            Err(DeckscopeError::ConfigParse { .. })
        ));
    }
}
