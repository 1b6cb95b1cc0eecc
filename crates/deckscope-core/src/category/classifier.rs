//! Card Categorizer
//!
//! Assigns functional labels to a card from its name, oracle text and type
//! line, using the rules held in a `RuleStore`.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::card::CardData;
use crate::error::{DeckscopeError, Result};

use super::builtin::{staple_categories, Category, CategorySet};
use super::store::RuleStore;

static BUILTIN: Lazy<Categorizer> = Lazy::new(|| {
    Categorizer::new(&RuleStore::builtin()).expect("builtin category patterns must compile")
});

/// Categorize with the builtin rules.
pub fn categorize(card: &CardData) -> CategorySet {
    BUILTIN.categorize(card)
}

/// Compiled rule table
pub struct Categorizer {
    compiled: Vec<(Category, Vec<Regex>)>,
}

impl Categorizer {
    /// Compile every pattern of `store` (case-insensitive)
    pub fn new(store: &RuleStore) -> Result<Self> {
        let mut compiled = Vec::with_capacity(store.all().len());

        for rule in store.all() {
            let patterns = rule
                .patterns
                .iter()
                .map(|p| {
                    RegexBuilder::new(&p.pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| DeckscopeError::InvalidPattern {
                            category: rule.category.to_string(),
                            message: e.to_string(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            compiled.push((rule.category, patterns));
        }

        Ok(Self { compiled })
    }

    /// Shared instance built from the builtin rules
    pub fn builtin() -> &'static Categorizer {
        &BUILTIN
    }

    /// Label a card. Total: the worst case is `{other}`.
    pub fn categorize(&self, card: &CardData) -> CategorySet {
        let mut labels: Vec<Category> = staple_categories(&card.name)
            .map(|cats| cats.to_vec())
            .unwrap_or_default();

        if card.is_land {
            labels.push(Category::Land);
            // Fetch lands match "onto the battlefield" but are still just lands
            if labels.iter().all(|c| *c == Category::Land) {
                return CategorySet::land();
            }
        }

        for (category, patterns) in &self.compiled {
            if patterns.iter().any(|re| re.is_match(&card.oracle_text)) {
                labels.push(*category);
            }
        }

        if card.type_line.contains("Land") {
            labels.push(Category::Land);
        }

        CategorySet::new(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(name: &str, type_line: &str, oracle: &str) -> CardData {
        CardData {
            name: name.to_string(),
            type_line: type_line.to_string(),
            oracle_text: oracle.to_string(),
            is_land: type_line.split("//").next().unwrap_or("").contains("Land"),
            is_creature: type_line.contains("Creature"),
            ..Default::default()
        }
    }

    fn labels(set: &CategorySet) -> Vec<Category> {
        set.iter().collect()
    }

    #[test]
    fn test_minus_x_is_removal() {
        let c = card("Dismember", "Instant", "Target creature gets -5/-5 until end of turn.");
        assert_eq!(labels(&categorize(&c)), vec![Category::Removal]);
    }

    #[test]
    fn test_destroy_all_is_board_wipe_only() {
        let c = card("Day of Judgment", "Sorcery", "Destroy all creatures.");
        assert_eq!(labels(&categorize(&c)), vec![Category::BoardWipe]);
    }

    #[test]
    fn test_wipe_with_sacrifice_gets_both() {
        let c = card(
            "Hypothetical Purge",
            "Sorcery",
            "Destroy all creatures. Each player sacrifices a creature.",
        );
        let result = categorize(&c);
        assert!(result.contains(Category::BoardWipe));
        assert!(result.contains(Category::Removal));
    }

    #[test]
    fn test_fetch_land_is_only_land() {
        let c = card(
            "Evolving Wilds",
            "Land",
            "{T}, Sacrifice Evolving Wilds: Search your library for a basic land card, \
             put it onto the battlefield tapped, then shuffle.",
        );
        assert_eq!(categorize(&c), CategorySet::land());
    }

    #[test]
    fn test_staple_overrides_text() {
        let c = card("Sol Ring", "Artifact", "{T}: Add {C}{C}.");
        assert!(categorize(&c).contains(Category::Ramp));

        // Staple with idiosyncratic text still gets its curated label
        let c = card("Wayfarer's Bauble", "Artifact", "{2}, {T}, Sacrifice this: Search...");
        assert!(categorize(&c).contains(Category::Ramp));
    }

    #[test]
    fn test_land_staple_keeps_matching() {
        // A land with a curated functional label is not short-circuited
        let mut c = card("Sol Ring", "Land", "{T}: Add one mana of any color.");
        c.is_land = true;
        let result = categorize(&c);
        assert!(result.contains(Category::Land));
        assert!(result.contains(Category::Ramp));
    }

    #[test]
    fn test_creature_with_draw_and_ramp() {
        let c = card(
            "Tireless Provisioner",
            "Creature — Elf Scout",
            "Landfall — Whenever a land you control enters, create a Food token or a Treasure token.",
        );
        assert_eq!(labels(&categorize(&c)), vec![Category::Ramp]);
    }

    #[test]
    fn test_vanilla_is_other() {
        let c = card("Grizzly Bears", "Creature — Bear", "");
        assert!(categorize(&c).is_other_only());
    }

    #[test]
    fn test_counterspell_and_tutor() {
        let c = card("Mana Leak", "Instant", "Counter target spell unless its controller pays {3}.");
        assert!(categorize(&c).contains(Category::Counterspell));

        let c = card(
            "Idyllic Tutor",
            "Sorcery",
            "Search your library for an enchantment card, reveal it, put it into your hand, then shuffle.",
        );
        assert!(categorize(&c).contains(Category::Tutor));
    }

    #[test]
    fn test_case_insensitive() {
        let c = card("Loud", "Sorcery", "DRAW TWO CARDS.");
        assert!(categorize(&c).contains(Category::Draw));
    }

    #[test]
    fn test_land_type_line_without_flag() {
        // Back face land: flag false, type line still mentions Land
        let mut c = card("Spikefield Hazard // Spikefield Cave", "Instant // Land", "");
        c.is_land = false;
        assert!(categorize(&c).contains(Category::Land));
    }

    #[test]
    fn test_configured_pattern_is_used() {
        use super::super::store::CategorizerConfig;

        let config = CategorizerConfig {
            patterns: [("draw".to_string(), vec!["investigate".to_string()])]
                .into_iter()
                .collect(),
        };
        let store = RuleStore::builtin().with_config(&config).unwrap();
        let categorizer = Categorizer::new(&store).unwrap();
        let c = card("Tamiyo's Journal", "Artifact", "At the beginning of your upkeep, investigate.");
        assert!(categorizer.categorize(&c).contains(Category::Draw));
        assert!(categorize(&c).is_other_only());
    }

    #[test]
    fn test_bad_configured_pattern_fails_construction() {
        use super::super::store::CategorizerConfig;

        let config = CategorizerConfig {
            patterns: [("ramp".to_string(), vec!["(unclosed".to_string()])]
                .into_iter()
                .collect(),
        };
        let store = RuleStore::builtin().with_config(&config).unwrap();
        assert!(matches!(
            Categorizer::new(&store),
            Err(DeckscopeError::InvalidPattern { .. })
        ));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn categorize_is_total_and_deterministic(
                name in ".{0,20}",
                type_line in "(Creature|Instant|Sorcery|Land|Artifact|Enchantment)( — [A-Za-z ]{0,12})?",
                oracle in ".{0,120}",
                is_land in any::<bool>(),
            ) {
                let c = CardData {
                    name,
                    type_line,
                    oracle_text: oracle,
                    is_land,
                    ..Default::default()
                };
                let first = categorize(&c);
                prop_assert!(!first.is_empty());
                prop_assert!(first.iter().all(|l| Category::ALL.contains(&l)));
                prop_assert_eq!(first, categorize(&c));
            }
        }
    }
}
