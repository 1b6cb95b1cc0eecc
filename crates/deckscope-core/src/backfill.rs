//! External label backfill
//!
//! Sends cards the rules left at `other` to an external classifier, caches
//! every answer by name, and applies the useful ones in one transaction.
//! A classifier failure degrades to a warning; cards stay at `other`.

use crate::card::CardData;
use crate::category::{validate_labels, CategorySet, ClassificationCache, ExternalClassifier};
use crate::error::Result;
use crate::llm::DEFAULT_BATCH_SIZE;
use crate::store::Store;

/// Candidates fetched per run
pub const DEFAULT_BACKFILL_LIMIT: usize = 200;

#[derive(Debug, Clone)]
pub struct BackfillOptions {
    pub limit: usize,
    pub batch_size: usize,
    /// Only list the candidates
    pub dry_run: bool,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_BACKFILL_LIMIT,
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct BackfillResult {
    /// Names considered this run
    pub candidates: Vec<String>,
    pub from_cache: usize,
    pub classified: usize,
    pub updated: usize,
    pub decks_recomputed: usize,
    pub warnings: Vec<String>,
}

pub fn backfill_categories(
    store: &mut Store,
    classifier: Option<&dyn ExternalClassifier>,
    cache: &mut ClassificationCache,
    options: &BackfillOptions,
) -> Result<BackfillResult> {
    let cards = store.uncategorized_cards(options.limit)?;
    let mut result = BackfillResult {
        candidates: cards.iter().map(|c| c.data.name.clone()).collect(),
        ..Default::default()
    };
    if options.dry_run || cards.is_empty() {
        return Ok(result);
    }

    let mut updates: Vec<(String, CategorySet)> = Vec::new();
    let mut pending: Vec<CardData> = Vec::new();
    for card in cards {
        match cache.get(&card.data.name) {
            Some(labels) => {
                result.from_cache += 1;
                if !labels.is_other_only() {
                    updates.push((card.data.name.clone(), labels.clone()));
                }
            }
            None => pending.push(card.data),
        }
    }

    match classifier {
        Some(classifier) => {
            for (i, batch) in pending.chunks(options.batch_size.max(1)).enumerate() {
                let answers = match classifier.classify(batch) {
                    Ok(answers) => answers,
                    Err(e) => {
                        result.warnings.push(format!("Batch {} failed: {}", i + 1, e));
                        continue;
                    }
                };
                for card in batch {
                    let Some(raw) = answers.get(&card.name) else {
                        continue;
                    };
                    result.classified += 1;
                    match validate_labels(raw) {
                        Some(labels) => {
                            cache.insert(card.name.clone(), labels.clone());
                            updates.push((card.name.clone(), labels));
                        }
                        None => cache.insert(card.name.clone(), CategorySet::other()),
                    }
                }
            }
        }
        None if !pending.is_empty() => result.warnings.push(format!(
            "External classifier unavailable, {} cards left as other",
            pending.len()
        )),
        None => {}
    }

    if let Err(e) = cache.flush() {
        result.warnings.push(format!("Could not write classification cache: {}", e));
    }

    let (updated, decks) = store.apply_external_categories(&updates)?;
    result.updated = updated;
    result.decks_recomputed = decks.len();
    Ok(result)
}
