//! Deck statistics
//!
//! Per-deck aggregates computed from the deck's card rows joined against the
//! current card records. The store caches the result; it can always be
//! recomputed from the join.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::card::Board;
use crate::category::{Category, CategorySet};

/// Curve buckets: 0, 1, 2, 3, 4, 5, 6+
pub const CURVE_BUCKETS: usize = 7;

/// Curve bucket of a mana value; everything from 6 up shares the last one.
pub fn curve_bucket(mana_value: f64) -> usize {
    (mana_value.max(0.0).trunc() as usize).min(CURVE_BUCKETS - 1)
}

pub fn curve_label(bucket: usize) -> String {
    if bucket + 1 >= CURVE_BUCKETS {
        format!("{}+", CURVE_BUCKETS - 1)
    } else {
        bucket.to_string()
    }
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Card attributes the aggregator needs
#[derive(Debug, Clone, PartialEq)]
pub struct CardFacts {
    pub mana_value: f64,
    pub type_line: String,
    pub is_land: bool,
    pub is_creature: bool,
    pub categories: CategorySet,
}

impl CardFacts {
    fn is_instant_or_sorcery(&self) -> bool {
        self.type_line.contains("Instant") || self.type_line.contains("Sorcery")
    }
}

/// One deck row joined with its card; `facts` is `None` when the card has no
/// metadata record.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedEntry {
    pub quantity: u32,
    pub board: Board,
    pub facts: Option<CardFacts>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeckStats {
    pub total_cards: u32,
    /// Mean over non-land cards, two decimals
    pub avg_mana_value: f64,
    pub land_count: u32,
    pub creature_count: u32,
    pub instant_sorcery_count: u32,
    pub curve: [u32; CURVE_BUCKETS],
    pub category_counts: BTreeMap<Category, u32>,
}

impl DeckStats {
    /// Aggregate mainboard rows. Commander and sideboard rows are ignored;
    /// cards without metadata count as non-land, mana value 0, unlabeled.
    pub fn compute(entries: &[JoinedEntry]) -> Self {
        let mut stats = Self::default();
        let mut mana_value_sum = 0.0;
        let mut nonland = 0u32;

        for entry in entries.iter().filter(|e| e.board == Board::Mainboard) {
            let qty = entry.quantity;
            stats.total_cards += qty;

            let Some(facts) = &entry.facts else {
                nonland += qty;
                stats.curve[0] += qty;
                continue;
            };

            if facts.is_land {
                stats.land_count += qty;
            } else {
                nonland += qty;
                mana_value_sum += facts.mana_value * f64::from(qty);
                stats.curve[curve_bucket(facts.mana_value)] += qty;
            }
            if facts.is_creature {
                stats.creature_count += qty;
            }
            if facts.is_instant_or_sorcery() {
                stats.instant_sorcery_count += qty;
            }
            for category in facts.categories.iter() {
                *stats.category_counts.entry(category).or_insert(0) += qty;
            }
        }

        stats.avg_mana_value = if nonland > 0 {
            round_to(mana_value_sum / f64::from(nonland), 2)
        } else {
            0.0
        };
        stats
    }

    pub fn category_count(&self, category: Category) -> u32 {
        self.category_counts.get(&category).copied().unwrap_or(0)
    }

    pub fn nonland_count(&self) -> u32 {
        self.total_cards - self.land_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(mana_value: f64, type_line: &str, categories: &[Category]) -> Option<CardFacts> {
        Some(CardFacts {
            mana_value,
            type_line: type_line.to_string(),
            is_land: type_line.contains("Land"),
            is_creature: type_line.contains("Creature"),
            categories: CategorySet::new(categories.iter().copied()),
        })
    }

    fn entry(quantity: u32, board: Board, facts: Option<CardFacts>) -> JoinedEntry {
        JoinedEntry {
            quantity,
            board,
            facts,
        }
    }

    #[test]
    fn test_curve_bucket() {
        assert_eq!(curve_bucket(0.0), 0);
        assert_eq!(curve_bucket(2.5), 2);
        assert_eq!(curve_bucket(6.0), 6);
        assert_eq!(curve_bucket(15.0), 6);
        assert_eq!(curve_label(6), "6+");
        assert_eq!(curve_label(3), "3");
    }

    #[test]
    fn test_quantities_accumulate() {
        let entries = vec![
            entry(4, Board::Mainboard, facts(0.0, "Basic Land — Island", &[Category::Land])),
            entry(1, Board::Mainboard, facts(2.0, "Instant", &[Category::Counterspell])),
            entry(2, Board::Mainboard, facts(3.0, "Creature — Elf", &[Category::Ramp, Category::Draw])),
        ];
        let stats = DeckStats::compute(&entries);
        assert_eq!(stats.total_cards, 7);
        assert_eq!(stats.land_count, 4);
        assert_eq!(stats.creature_count, 2);
        assert_eq!(stats.instant_sorcery_count, 1);
        assert_eq!(stats.curve, [0, 0, 1, 2, 0, 0, 0]);
        assert_eq!(stats.avg_mana_value, 2.67);
        assert_eq!(stats.category_count(Category::Ramp), 2);
        assert_eq!(stats.category_count(Category::Land), 4);
    }

    #[test]
    fn test_commander_board_excluded() {
        let entries = vec![
            entry(1, Board::Commander, facts(7.0, "Legendary Creature — Dragon", &[Category::Other])),
            entry(1, Board::Sideboard, facts(2.0, "Creature — Cat", &[Category::Other])),
            entry(1, Board::Mainboard, facts(1.0, "Artifact", &[Category::Ramp])),
        ];
        let stats = DeckStats::compute(&entries);
        assert_eq!(stats.total_cards, 1);
        assert_eq!(stats.curve[6], 0);
        assert_eq!(stats.creature_count, 0);
        assert_eq!(stats.category_count(Category::Other), 0);
    }

    #[test]
    fn test_all_lands_average_zero() {
        let entries = vec![entry(10, Board::Mainboard, facts(0.0, "Land", &[Category::Land]))];
        let stats = DeckStats::compute(&entries);
        assert_eq!(stats.avg_mana_value, 0.0);
        assert_eq!(stats.curve.iter().sum::<u32>(), 0);
    }

    #[test]
    fn test_missing_metadata_tolerated() {
        let entries = vec![
            entry(1, Board::Mainboard, None),
            entry(1, Board::Mainboard, facts(4.0, "Sorcery", &[Category::BoardWipe])),
        ];
        let stats = DeckStats::compute(&entries);
        assert_eq!(stats.total_cards, 2);
        assert_eq!(stats.curve[0], 1);
        assert_eq!(stats.avg_mana_value, 2.0);
        assert_eq!(stats.category_counts.len(), 1);
    }

    #[test]
    fn test_stats_json_shape() {
        let entries = vec![entry(1, Board::Mainboard, facts(2.0, "Instant", &[Category::BoardWipe]))];
        let stats = DeckStats::compute(&entries);
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"board_wipe\":1"));
        let back: DeckStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_entry() -> impl Strategy<Value = JoinedEntry> {
            (
                1u32..5,
                prop_oneof![Just(Board::Mainboard), Just(Board::Commander), Just(Board::Sideboard)],
                proptest::option::of((0.0f64..12.0, any::<bool>())),
            )
                .prop_map(|(quantity, board, card)| JoinedEntry {
                    quantity,
                    board,
                    facts: card.map(|(mana_value, is_land)| CardFacts {
                        mana_value,
                        type_line: if is_land { "Land".into() } else { "Sorcery".into() },
                        is_land,
                        is_creature: false,
                        categories: if is_land { CategorySet::land() } else { CategorySet::other() },
                    }),
                })
        }

        proptest! {
            #[test]
            fn aggregation_never_drops_or_double_counts(entries in proptest::collection::vec(arb_entry(), 0..40)) {
                let stats = DeckStats::compute(&entries);
                let mainboard: u32 = entries
                    .iter()
                    .filter(|e| e.board == Board::Mainboard)
                    .map(|e| e.quantity)
                    .sum();
                prop_assert_eq!(stats.total_cards, mainboard);
                prop_assert_eq!(stats.curve.iter().sum::<u32>(), stats.total_cards - stats.land_count);

                let labeled: u32 = entries
                    .iter()
                    .filter(|e| e.board == Board::Mainboard && e.facts.is_some())
                    .map(|e| e.quantity)
                    .sum();
                prop_assert_eq!(stats.category_counts.values().sum::<u32>(), labeled);
                prop_assert_eq!(DeckStats::compute(&entries), stats);
            }
        }
    }
}
