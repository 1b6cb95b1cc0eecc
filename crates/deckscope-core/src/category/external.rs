//! External Classifier
//!
//! Optional oracle that labels cards the rules left at `other`. Its answers
//! go through the same vocabulary check as every other label source.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::card::CardData;
use crate::error::Result;
use crate::llm::{execute_claude, extract_json_from_output, require_claude_cli};

use super::builtin::{Category, CategorySet};

/// Batch labeller: card name -> raw label strings
pub trait ExternalClassifier {
    fn classify(&self, cards: &[CardData]) -> Result<HashMap<String, Vec<String>>>;
}

/// Keep only vocabulary labels. `None` when nothing usable remains or the
/// answer is just `other`.
pub fn validate_labels(raw: &[String]) -> Option<CategorySet> {
    let labels: Vec<Category> = raw.iter().filter_map(|l| l.parse().ok()).collect();
    if labels.is_empty() {
        return None;
    }
    let set = CategorySet::new(labels);
    if set.is_other_only() {
        None
    } else {
        Some(set)
    }
}

/// Classifier backed by the `claude` CLI
pub struct ClaudeClassifier {
    working_dir: PathBuf,
}

impl ClaudeClassifier {
    /// Fails when the CLI is not installed
    pub fn new(working_dir: PathBuf) -> Result<Self> {
        require_claude_cli()?;
        Ok(Self { working_dir })
    }

    fn build_prompt(cards: &[CardData]) -> String {
        let category_list: String = Category::ALL
            .iter()
            .map(|c| format!("- {}: {}\n", c, c.description()))
            .collect();

        let card_list = cards
            .iter()
            .map(|c| {
                format!(
                    "- {} | {} | {} | {}",
                    c.name,
                    c.mana_cost,
                    c.type_line,
                    c.oracle_text.replace('\n', " ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"Categorize each Magic: The Gathering card into one or more functional categories for Commander deck analysis.

## Categories (assign ALL that apply)

{category_list}
## Cards

{card_list}

## Output Format

Respond with ONLY a JSON object mapping card name to category array. No explanation.

Example:
```json
{{"Sol Ring": ["ramp"], "Swords to Plowshares": ["removal"]}}
```
"#
        )
    }
}

impl ExternalClassifier for ClaudeClassifier {
    fn classify(&self, cards: &[CardData]) -> Result<HashMap<String, Vec<String>>> {
        if cards.is_empty() {
            return Ok(HashMap::new());
        }
        let output = execute_claude(&self.working_dir, &Self::build_prompt(cards))?;
        parse_classifier_output(&output)
    }
}

/// Parse `{"name": ["label", ...]}`, dropping entries whose value is not a list
pub fn parse_classifier_output(output: &str) -> Result<HashMap<String, Vec<String>>> {
    let json_str = extract_json_from_output(output);
    let value: serde_json::Value = serde_json::from_str(json_str)?;

    let mut results = HashMap::new();
    if let serde_json::Value::Object(map) = value {
        for (name, labels) in map {
            if let serde_json::Value::Array(items) = labels {
                let labels = items
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                results.insert(name, labels);
            }
        }
    }
    Ok(results)
}
