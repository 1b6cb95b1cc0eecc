//! Deck filter
//!
//! Predicates over deck records. Every set predicate must hold; an empty
//! filter matches every deck.

use serde::{Deserialize, Serialize};

use crate::color::{ColorIdentity, ColorMode};
use crate::deck::DeckRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckFilter {
    pub colors: Option<ColorIdentity>,
    #[serde(default)]
    pub color_mode: ColorMode,
    pub bracket: Option<u32>,
    pub commander_mana_value: Option<f64>,
    /// Matches the commander or the partner
    pub commander: Option<String>,
}

impl DeckFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn colors(mut self, colors: ColorIdentity, mode: ColorMode) -> Self {
        self.colors = Some(colors);
        self.color_mode = mode;
        self
    }

    pub fn bracket(mut self, bracket: u32) -> Self {
        self.bracket = Some(bracket);
        self
    }

    pub fn commander_mana_value(mut self, mana_value: f64) -> Self {
        self.commander_mana_value = Some(mana_value);
        self
    }

    pub fn commander(mut self, name: impl Into<String>) -> Self {
        self.commander = Some(name.into());
        self
    }

    /// Same filter with a different bracket
    pub fn with_bracket(&self, bracket: Option<u32>) -> Self {
        Self {
            bracket,
            ..self.clone()
        }
    }

    pub fn matches(&self, deck: &DeckRecord) -> bool {
        if let Some(query) = self.colors {
            if !self.color_mode.matches(deck.color_identity, query) {
                return false;
            }
        }
        if let Some(bracket) = self.bracket {
            if deck.bracket != Some(bracket) {
                return false;
            }
        }
        if let Some(mana_value) = self.commander_mana_value {
            if (deck.commander_mana_value - mana_value).abs() > f64::EPSILON {
                return false;
            }
        }
        if let Some(name) = &self.commander {
            let partner_matches = deck.partner.as_deref() == Some(name.as_str());
            if deck.commander != *name && !partner_matches {
                return false;
            }
        }
        true
    }

    /// Ids of the matching decks, in input order
    pub fn resolve(&self, decks: &[DeckRecord]) -> Vec<i64> {
        decks
            .iter()
            .filter(|d| self.matches(d))
            .map(|d| d.id)
            .collect()
    }

    /// Human-readable color label for report headers ("ALL" when unfiltered)
    pub fn color_label(&self) -> String {
        match self.colors {
            Some(colors) => colors.to_string(),
            None => "ALL".to_string(),
        }
    }

    pub fn color_name(&self) -> String {
        match self.colors {
            Some(colors) => colors.name().to_string(),
            None => "All colors".to_string(),
        }
    }
}
