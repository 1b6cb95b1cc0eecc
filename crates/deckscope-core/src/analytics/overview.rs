//! Collection overview: deck listing and per-color / per-bracket counts.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::deck::DeckRecord;
use crate::error::Result;
use crate::filter::DeckFilter;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorCount {
    /// WUBRG key, empty for colorless
    pub key: String,
    pub colors: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketCount {
    pub bracket: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub total_decks: usize,
    pub unique_cards: usize,
    pub by_color: Vec<ColorCount>,
    pub by_bracket: Vec<BracketCount>,
}

/// Matching decks, newest first, at most `limit`
pub fn list_decks(store: &Store, filter: &DeckFilter, limit: usize) -> Result<Vec<DeckRecord>> {
    let mut decks = store.matching_decks(filter)?;
    decks.truncate(limit);
    Ok(decks)
}

pub fn summary(store: &Store) -> Result<CollectionSummary> {
    let decks = store.decks()?;

    let mut colors: BTreeMap<String, (&'static str, usize)> = BTreeMap::new();
    let mut brackets: BTreeMap<u32, usize> = BTreeMap::new();
    for deck in &decks {
        colors
            .entry(deck.color_identity.key())
            .or_insert((deck.color_identity.name(), 0))
            .1 += 1;
        if let Some(bracket) = deck.bracket {
            *brackets.entry(bracket).or_insert(0) += 1;
        }
    }

    let mut by_color: Vec<ColorCount> = colors
        .into_iter()
        .map(|(key, (name, count))| ColorCount {
            key,
            colors: name.to_string(),
            count,
        })
        .collect();
    by_color.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));

    Ok(CollectionSummary {
        total_decks: decks.len(),
        unique_cards: store.unique_card_count()?,
        by_color,
        by_bracket: brackets
            .into_iter()
            .map(|(bracket, count)| BracketCount { bracket, count })
            .collect(),
    })
}
