use serde::{Deserialize, Serialize};

use crate::card::{Board, DeckEntry};
use crate::color::ColorIdentity;
use crate::stats::DeckStats;

/// A deck ready to be stored. Color identity and commander mana value are
/// not part of it: the store derives both from the commander cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDeck {
    pub name: String,
    pub source_file: Option<String>,
    pub builder: Option<String>,
    pub commander: String,
    pub partner: Option<String>,
    pub bracket: Option<u32>,
    pub entries: Vec<DeckEntry>,
}

impl NewDeck {
    /// Commander and partner names, in that order
    pub fn commander_names(&self) -> Vec<&str> {
        std::iter::once(self.commander.as_str())
            .chain(self.partner.as_deref())
            .collect()
    }

    pub fn mainboard(&self) -> impl Iterator<Item = &DeckEntry> {
        self.entries.iter().filter(|e| e.board == Board::Mainboard)
    }
}

/// A stored deck with its cached statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckRecord {
    pub id: i64,
    pub name: String,
    pub source_file: Option<String>,
    pub builder: Option<String>,
    pub date_added: String,
    pub commander: String,
    pub partner: Option<String>,
    pub color_identity: ColorIdentity,
    pub bracket: Option<u32>,
    pub commander_mana_value: f64,
    /// `None` until statistics have been computed
    pub stats: Option<DeckStats>,
}

impl DeckRecord {
    pub fn commander_label(&self) -> String {
        match &self.partner {
            Some(partner) => format!("{} + {}", self.commander, partner),
            None => self.commander.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commander_names_with_partner() {
        let deck = NewDeck {
            commander: "Tymna the Weaver".to_string(),
            partner: Some("Kraum, Ludevic's Opus".to_string()),
            ..Default::default()
        };
        assert_eq!(
            deck.commander_names(),
            vec!["Tymna the Weaver", "Kraum, Ludevic's Opus"]
        );
    }

    #[test]
    fn test_commander_label() {
        let deck = DeckRecord {
            commander: "Tymna the Weaver".to_string(),
            partner: Some("Kraum, Ludevic's Opus".to_string()),
            ..Default::default()
        };
        assert_eq!(deck.commander_label(), "Tymna the Weaver + Kraum, Ludevic's Opus");
    }
}
