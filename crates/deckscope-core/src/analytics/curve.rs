//! Curve and slot reports built on cached deck statistics.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::card::Board;
use crate::category::{Category, CategorySet};
use crate::deck::DeckRecord;
use crate::error::Result;
use crate::filter::DeckFilter;
use crate::stats::{curve_bucket, curve_label, round_to, DeckStats, CURVE_BUCKETS};
use crate::store::Store;

use super::{mean, percentage, Report, NO_MATCHING_DECKS};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveBucket {
    pub label: String,
    pub avg: f64,
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveProfile {
    pub color_identity: String,
    pub bracket: Option<u32>,
    pub commander_mana_value: Option<f64>,
    pub deck_count: usize,
    pub curve: Vec<CurveBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpread {
    pub avg: f64,
    pub min: u32,
    pub max: u32,
    pub decks_with: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDistribution {
    pub color_identity: String,
    pub bracket: Option<u32>,
    pub deck_count: usize,
    pub categories: BTreeMap<Category, CategorySpread>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpellCount {
    pub name: String,
    pub count: usize,
    pub pct: f64,
    pub categories: CategorySet,
    pub type_line: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommanderCostGroup {
    pub commander_mana_value: u32,
    pub deck_count: usize,
    pub commanders: Vec<String>,
    pub avg_deck_mana_value: f64,
    pub avg_curve: Vec<f64>,
    pub avg_ramp: f64,
    pub avg_draw: f64,
    pub avg_lands: f64,
    /// Curve bucket -> most played non-land spells at that cost
    pub top_spells: BTreeMap<usize, Vec<SpellCount>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostCurveReport {
    pub color_identity: String,
    pub bracket: Option<u32>,
    pub deck_count: usize,
    pub groups: Vec<CommanderCostGroup>,
}

fn cached_stats(decks: &[DeckRecord]) -> Vec<&DeckStats> {
    decks.iter().filter_map(|d| d.stats.as_ref()).collect()
}

pub fn curve_profile(store: &Store, filter: &DeckFilter) -> Result<Report<CurveProfile>> {
    let decks = store.matching_decks(filter)?;
    if decks.is_empty() {
        return Ok(Report::no_data(NO_MATCHING_DECKS, 0));
    }
    let stats = cached_stats(&decks);
    if stats.is_empty() {
        return Ok(Report::no_data("No curve data available", decks.len()));
    }

    let curve = (0..CURVE_BUCKETS)
        .map(|bucket| {
            let values: Vec<u32> = stats.iter().map(|s| s.curve[bucket]).collect();
            CurveBucket {
                label: curve_label(bucket),
                avg: round_to(mean(&values), 1),
                min: values.iter().copied().min().unwrap_or(0),
                max: values.iter().copied().max().unwrap_or(0),
            }
        })
        .collect();

    Ok(Report::Ready(CurveProfile {
        color_identity: filter.color_label(),
        bracket: filter.bracket,
        commander_mana_value: filter.commander_mana_value,
        deck_count: decks.len(),
        curve,
    }))
}

/// Slots per label, over the decks that run at least one card with it
pub fn category_distribution(
    store: &Store,
    filter: &DeckFilter,
) -> Result<Report<CategoryDistribution>> {
    let decks = store.matching_decks(filter)?;
    if decks.is_empty() {
        return Ok(Report::no_data(NO_MATCHING_DECKS, 0));
    }

    let mut counts: BTreeMap<Category, Vec<u32>> = BTreeMap::new();
    for stats in cached_stats(&decks) {
        for (category, count) in &stats.category_counts {
            if *count > 0 {
                counts.entry(*category).or_default().push(*count);
            }
        }
    }

    let categories = counts
        .into_iter()
        .map(|(category, values)| {
            let spread = CategorySpread {
                avg: round_to(mean(&values), 1),
                min: values.iter().copied().min().unwrap_or(0),
                max: values.iter().copied().max().unwrap_or(0),
                decks_with: values.len(),
            };
            (category, spread)
        })
        .collect();

    Ok(Report::Ready(CategoryDistribution {
        color_identity: filter.color_label(),
        bracket: filter.bracket,
        deck_count: decks.len(),
        categories,
    }))
}

/// How commander cost shapes the rest of the deck.
///
/// Decks are grouped by the whole part of their commander's mana value.
pub fn cost_curve_correlation(
    store: &Store,
    filter: &DeckFilter,
    top_spells_per_bucket: usize,
) -> Result<Report<CostCurveReport>> {
    let decks = store.matching_decks(filter)?;
    if decks.is_empty() {
        return Ok(Report::no_data(NO_MATCHING_DECKS, 0));
    }

    let mut by_cost: BTreeMap<u32, Vec<&DeckRecord>> = BTreeMap::new();
    for deck in &decks {
        let cost = deck.commander_mana_value.max(0.0).trunc() as u32;
        by_cost.entry(cost).or_default().push(deck);
    }

    let mut groups = Vec::with_capacity(by_cost.len());
    for (cost, group) in by_cost {
        groups.push(cost_group(store, cost, &group, top_spells_per_bucket)?);
    }

    Ok(Report::Ready(CostCurveReport {
        color_identity: filter.color_label(),
        bracket: filter.bracket,
        deck_count: decks.len(),
        groups,
    }))
}

/// One value per deck; decks without statistics count as 0
fn per_deck(group: &[&DeckRecord], f: impl Fn(&DeckStats) -> u32) -> Vec<u32> {
    group
        .iter()
        .map(|d| d.stats.as_ref().map_or(0, &f))
        .collect()
}

fn cost_group(
    store: &Store,
    cost: u32,
    group: &[&DeckRecord],
    top_n: usize,
) -> Result<CommanderCostGroup> {
    let n = group.len();
    let stats: Vec<&DeckStats> = group.iter().filter_map(|d| d.stats.as_ref()).collect();
    let avg_curve = (0..CURVE_BUCKETS)
        .map(|bucket| {
            let values: Vec<u32> = stats.iter().map(|s| s.curve[bucket]).collect();
            round_to(mean(&values), 1)
        })
        .collect();

    let avg_deck_mana_value = round_to(
        group
            .iter()
            .map(|d| d.stats.as_ref().map_or(0.0, |s| s.avg_mana_value))
            .sum::<f64>()
            / n as f64,
        2,
    );

    let commanders: BTreeSet<String> = group.iter().map(|d| d.commander.clone()).collect();

    // Distinct decks per non-land spell, bucketed by its own cost
    let deck_ids: Vec<i64> = group.iter().map(|d| d.id).collect();
    let rows = store.deck_cards(&deck_ids, Board::Mainboard)?;
    let cards = store.cards_named(rows.iter().map(|r| r.card_name.as_str()))?;
    let mut spell_decks: BTreeMap<&str, BTreeSet<i64>> = BTreeMap::new();
    for row in &rows {
        if cards.get(&row.card_name).is_some_and(|c| !c.data.is_land) {
            spell_decks.entry(&row.card_name).or_default().insert(row.deck_id);
        }
    }

    let mut buckets: BTreeMap<usize, Vec<(&str, usize)>> = BTreeMap::new();
    for (name, decks) in spell_decks {
        let bucket = curve_bucket(cards[name].data.mana_value);
        buckets.entry(bucket).or_default().push((name, decks.len()));
    }

    let top_spells = buckets
        .into_iter()
        .map(|(bucket, mut spells)| {
            spells.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            spells.truncate(top_n);
            let spells = spells
                .into_iter()
                .map(|(name, count)| {
                    let card = &cards[name];
                    SpellCount {
                        name: name.to_string(),
                        count,
                        pct: percentage(count, n),
                        categories: card.categories.clone(),
                        type_line: card.data.type_line.clone(),
                    }
                })
                .collect();
            (bucket, spells)
        })
        .collect();

    Ok(CommanderCostGroup {
        commander_mana_value: cost,
        deck_count: n,
        commanders: commanders.into_iter().collect(),
        avg_deck_mana_value,
        avg_curve,
        avg_ramp: round_to(mean(&per_deck(group, |s| s.category_count(Category::Ramp))), 1),
        avg_draw: round_to(mean(&per_deck(group, |s| s.category_count(Category::Draw))), 1),
        avg_lands: round_to(mean(&per_deck(group, |s| s.land_count)), 1),
        top_spells,
    })
}
