//! # Analytics
//!
//! Read-only reports over a filtered deck set. Every report returns
//! [`Report::Ready`] with its payload, or [`Report::NoData`] carrying the
//! reason and the number of decks that matched. `Err` is reserved for store
//! failures.
//!
//! ## Reports
//!
//! - `cards`: staples, bracket comparison, ramp by commander cost
//! - `curve`: curve profile, category distribution, cost/curve correlation
//! - `packages`: co-occurrence package detection
//! - `overview`: deck listing and collection summary

mod cards;
mod curve;
mod overview;
mod packages;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::store::DeckCardRow;

pub use cards::{
    compare_brackets, ramp_by_commander_mana_value, top_cards, BracketComparison, BracketDiff,
    CardCount, RampProfile, StapleCard, TopCards, ValueRange,
};
pub use curve::{
    category_distribution, cost_curve_correlation, curve_profile, CategoryDistribution,
    CategorySpread, CommanderCostGroup, CostCurveReport, CurveBucket, CurveProfile, SpellCount,
};
pub use overview::{list_decks, summary, BracketCount, CollectionSummary, ColorCount};
pub use packages::{
    detect_packages, find_packages, jaccard, Package, PackageParams, PackageReport,
    MIN_PACKAGE_DECKS,
};

pub(crate) const NO_MATCHING_DECKS: &str = "No matching decks found";

/// Structured "nothing to report" payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoData {
    pub error: String,
    pub deck_count: usize,
}

/// Outcome of an analytics query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report<T> {
    Ready(T),
    NoData(NoData),
}

impl<T> Report<T> {
    pub fn no_data(reason: impl Into<String>, deck_count: usize) -> Self {
        Self::NoData(NoData {
            error: reason.into(),
            deck_count,
        })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(payload) => Some(payload),
            Self::NoData(_) => None,
        }
    }
}

/// Card name -> ids of the decks running it
pub(crate) fn card_presence(rows: &[DeckCardRow]) -> BTreeMap<String, BTreeSet<i64>> {
    let mut presence: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();
    for row in rows {
        presence
            .entry(row.card_name.clone())
            .or_default()
            .insert(row.deck_id);
    }
    presence
}

/// `part / whole` as a percentage, one decimal
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    crate::stats::round_to(part as f64 / whole as f64 * 100.0, 1)
}

pub(crate) fn mean(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    f64::from(values.iter().sum::<u32>()) / values.len() as f64
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Store seeding shared by the report tests

    use crate::card::{Board, CardData, DeckEntry};
    use crate::category::categorize;
    use crate::color::ColorIdentity;
    use crate::deck::NewDeck;
    use crate::store::Store;

    pub fn card(name: &str, colors: &str, mv: f64, type_line: &str, oracle: &str) -> CardData {
        CardData {
            name: name.to_string(),
            color_identity: if colors.is_empty() {
                ColorIdentity::COLORLESS
            } else {
                colors.parse().unwrap()
            },
            mana_value: mv,
            type_line: type_line.to_string(),
            oracle_text: oracle.to_string(),
            is_land: type_line.contains("Land"),
            is_creature: type_line.contains("Creature"),
            ..Default::default()
        }
    }

    pub fn add_card(store: &Store, card: CardData) {
        store.upsert_card(&card, &categorize(&card)).unwrap();
    }

    /// Store a deck: commander card is seeded when `commander_mv` is given
    pub fn add_deck(
        store: &mut Store,
        commander: &str,
        colors: &str,
        commander_mv: f64,
        bracket: Option<u32>,
        mainboard: &[(&str, u32)],
    ) -> i64 {
        add_card(
            store,
            card(commander, colors, commander_mv, "Legendary Creature — Wizard", ""),
        );
        let mut entries = vec![DeckEntry::new(commander, 1, Board::Commander)];
        entries.extend(mainboard.iter().map(|(n, q)| DeckEntry::mainboard(*n, *q)));
        store
            .insert_deck(&NewDeck {
                name: format!("{} deck", commander),
                commander: commander.to_string(),
                bracket,
                entries,
                ..Default::default()
            })
            .unwrap()
            .id
    }
}
