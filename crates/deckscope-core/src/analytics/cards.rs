//! Card-level reports: staples, bracket comparison, ramp by commander cost.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::card::Board;
use crate::category::Category;
use crate::error::Result;
use crate::filter::DeckFilter;
use crate::store::Store;

use super::{card_presence, mean, percentage, Report, NO_MATCHING_DECKS};

/// A card with the number of filtered decks running it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardCount {
    pub name: String,
    pub appearances: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StapleCard {
    pub name: String,
    pub appearances: usize,
    pub percentage: f64,
    /// `None` when the card has no metadata record
    pub mana_value: Option<f64>,
    pub type_line: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCards {
    pub color_identity: String,
    pub color_name: String,
    pub bracket: Option<u32>,
    pub deck_count: usize,
    /// Cards filed under their primary label
    pub cards_by_category: BTreeMap<Category, Vec<StapleCard>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketDiff {
    pub name: String,
    pub pct_a: f64,
    pub pct_b: f64,
    /// Absolute play-rate difference in percentage points
    pub diff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketComparison {
    pub color_identity: String,
    pub color_name: String,
    pub bracket_a: u32,
    pub bracket_b: u32,
    pub decks_a: usize,
    pub decks_b: usize,
    pub more_in_bracket_a: Vec<BracketDiff>,
    pub more_in_bracket_b: Vec<BracketDiff>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: u32,
    pub max: u32,
}

impl ValueRange {
    fn of(values: &[u32]) -> Self {
        Self {
            min: values.iter().copied().min().unwrap_or(0),
            max: values.iter().copied().max().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RampProfile {
    pub commander_mana_value: f64,
    pub color_identity: String,
    pub deck_count: usize,
    pub avg_ramp_count: f64,
    pub avg_land_count: f64,
    pub ramp_range: ValueRange,
    pub top_ramp_cards: Vec<CardCount>,
}

/// Sort (name, count) pairs by count descending, then name
fn rank(counts: &mut [(String, usize)]) {
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
}

/// Most played mainboard cards across the filtered decks.
///
/// Cards in fewer than `min_appearances` decks are dropped and at most
/// `limit` cards are kept overall.
pub fn top_cards(
    store: &Store,
    filter: &DeckFilter,
    min_appearances: u32,
    limit: usize,
) -> Result<Report<TopCards>> {
    let deck_ids = store.matching_deck_ids(filter)?;
    if deck_ids.is_empty() {
        return Ok(Report::no_data(NO_MATCHING_DECKS, 0));
    }

    let presence = card_presence(&store.deck_cards(&deck_ids, Board::Mainboard)?);
    let mut counts: Vec<(String, usize)> = presence
        .into_iter()
        .map(|(name, decks)| (name, decks.len()))
        .filter(|(_, n)| *n >= min_appearances as usize)
        .collect();
    rank(&mut counts);
    counts.truncate(limit);

    let cards = store.cards_named(counts.iter().map(|(n, _)| n.as_str()))?;
    let mut cards_by_category: BTreeMap<Category, Vec<StapleCard>> = BTreeMap::new();
    for (name, appearances) in counts {
        let card = cards.get(&name);
        let primary = card.map(|c| c.categories.primary()).unwrap_or(Category::Other);
        cards_by_category.entry(primary).or_default().push(StapleCard {
            appearances,
            percentage: percentage(appearances, deck_ids.len()),
            mana_value: card.map(|c| c.data.mana_value),
            type_line: card.map(|c| c.data.type_line.clone()).unwrap_or_default(),
            name,
        });
    }

    Ok(Report::Ready(TopCards {
        color_identity: filter.color_label(),
        color_name: filter.color_name(),
        bracket: filter.bracket,
        deck_count: deck_ids.len(),
        cards_by_category,
    }))
}

/// Cards whose play rate differs between two brackets by more than
/// `threshold` (a fraction), split by the side that plays them more.
pub fn compare_brackets(
    store: &Store,
    filter: &DeckFilter,
    bracket_a: u32,
    bracket_b: u32,
    threshold: f64,
    limit: usize,
) -> Result<Report<BracketComparison>> {
    let ids_a = store.matching_deck_ids(&filter.with_bracket(Some(bracket_a)))?;
    let ids_b = store.matching_deck_ids(&filter.with_bracket(Some(bracket_b)))?;
    if ids_a.is_empty() || ids_b.is_empty() {
        return Ok(Report::no_data(
            format!(
                "Need decks in both brackets (bracket {}: {}, bracket {}: {})",
                bracket_a,
                ids_a.len(),
                bracket_b,
                ids_b.len()
            ),
            ids_a.len() + ids_b.len(),
        ));
    }

    let rates = |ids: &[i64]| -> Result<BTreeMap<String, f64>> {
        let presence = card_presence(&store.deck_cards(ids, Board::Mainboard)?);
        Ok(presence
            .into_iter()
            .map(|(name, decks)| (name, decks.len() as f64 / ids.len() as f64))
            .collect())
    };
    let rate_a = rates(&ids_a)?;
    let rate_b = rates(&ids_b)?;

    let names: BTreeSet<&String> = rate_a.keys().chain(rate_b.keys()).collect();
    let mut more_in_a = Vec::new();
    let mut more_in_b = Vec::new();
    for name in names {
        let a = rate_a.get(name).copied().unwrap_or(0.0);
        let b = rate_b.get(name).copied().unwrap_or(0.0);
        if (a - b).abs() <= threshold {
            continue;
        }
        let diff = BracketDiff {
            name: name.clone(),
            pct_a: crate::stats::round_to(a * 100.0, 1),
            pct_b: crate::stats::round_to(b * 100.0, 1),
            diff: crate::stats::round_to((a - b).abs() * 100.0, 1),
        };
        if a > b {
            more_in_a.push(diff);
        } else {
            more_in_b.push(diff);
        }
    }

    for side in [&mut more_in_a, &mut more_in_b] {
        side.sort_by(|x, y| y.diff.total_cmp(&x.diff).then_with(|| x.name.cmp(&y.name)));
        side.truncate(limit);
    }

    Ok(Report::Ready(BracketComparison {
        color_identity: filter.color_label(),
        color_name: filter.color_name(),
        bracket_a,
        bracket_b,
        decks_a: ids_a.len(),
        decks_b: ids_b.len(),
        more_in_bracket_a: more_in_a,
        more_in_bracket_b: more_in_b,
    }))
}

/// Ramp density for decks whose commander costs `mana_value`
pub fn ramp_by_commander_mana_value(
    store: &Store,
    filter: &DeckFilter,
    mana_value: f64,
    top_n: usize,
) -> Result<Report<RampProfile>> {
    let filter = filter.clone().commander_mana_value(mana_value);
    let decks = store.matching_decks(&filter)?;
    if decks.is_empty() {
        return Ok(Report::no_data(
            format!("No decks with commander mana value {}", mana_value),
            0,
        ));
    }

    let ramp_counts: Vec<u32> = decks
        .iter()
        .map(|d| d.stats.as_ref().map_or(0, |s| s.category_count(Category::Ramp)))
        .collect();
    let land_counts: Vec<u32> = decks
        .iter()
        .map(|d| d.stats.as_ref().map_or(0, |s| s.land_count))
        .collect();

    let deck_ids: Vec<i64> = decks.iter().map(|d| d.id).collect();
    let presence = card_presence(&store.deck_cards(&deck_ids, Board::Mainboard)?);
    let cards = store.cards_named(presence.keys().map(String::as_str))?;
    let mut ramp: Vec<(String, usize)> = presence
        .into_iter()
        .filter(|(name, _)| {
            cards
                .get(name)
                .is_some_and(|c| c.categories.contains(Category::Ramp))
        })
        .map(|(name, decks)| (name, decks.len()))
        .collect();
    rank(&mut ramp);
    ramp.truncate(top_n);

    let total = decks.len();
    Ok(Report::Ready(RampProfile {
        commander_mana_value: mana_value,
        color_identity: filter.color_label(),
        deck_count: total,
        avg_ramp_count: crate::stats::round_to(mean(&ramp_counts), 1),
        avg_land_count: crate::stats::round_to(mean(&land_counts), 1),
        ramp_range: ValueRange::of(&ramp_counts),
        top_ramp_cards: ramp
            .into_iter()
            .map(|(name, appearances)| CardCount {
                name,
                appearances,
                percentage: percentage(appearances, total),
            })
            .collect(),
    }))
}
