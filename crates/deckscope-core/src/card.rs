//! Card and deck-entry records shared by ingestion, storage and analytics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::category::CategorySet;
use crate::color::ColorIdentity;
use crate::error::DeckscopeError;

/// Card attributes supplied by the metadata provider
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CardData {
    /// Canonical name (unique key)
    pub name: String,
    pub color_identity: ColorIdentity,
    pub mana_value: f64,
    #[serde(default)]
    pub mana_cost: String,
    #[serde(default)]
    pub type_line: String,
    #[serde(default)]
    pub oracle_text: String,
    #[serde(default)]
    pub is_land: bool,
    #[serde(default)]
    pub is_creature: bool,
}

/// Where a card's labels came from.
///
/// Labels from `Manual` and `External` survive re-import; only `Rules`
/// labels are recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    #[default]
    Rules,
    External,
    Manual,
}

impl CategorySource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::External => "external",
            Self::Manual => "manual",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "external" => Self::External,
            "manual" => Self::Manual,
            _ => Self::Rules,
        }
    }
}

/// A stored card: provider attributes plus labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(flatten)]
    pub data: CardData,
    pub categories: CategorySet,
    pub category_source: CategorySource,
}

/// Deck section a card entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Board {
    #[default]
    Mainboard,
    Commander,
    Sideboard,
}

impl Board {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mainboard => "mainboard",
            Self::Commander => "commander",
            Self::Sideboard => "sideboard",
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Board {
    type Err = DeckscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainboard" => Ok(Self::Mainboard),
            "commander" => Ok(Self::Commander),
            "sideboard" => Ok(Self::Sideboard),
            other => Err(DeckscopeError::ConfigValue {
                key: "board".to_string(),
                message: format!("unknown board '{}'", other),
            }),
        }
    }
}

/// One line of a decklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub name: String,
    pub quantity: u32,
    pub board: Board,
}

impl DeckEntry {
    pub fn new(name: impl Into<String>, quantity: u32, board: Board) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.max(1),
            board,
        }
    }

    pub fn mainboard(name: impl Into<String>, quantity: u32) -> Self {
        Self::new(name, quantity, Board::Mainboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_at_least_one() {
        let entry = DeckEntry::mainboard("Island", 0);
        assert_eq!(entry.quantity, 1);
    }

    #[test]
    fn test_board_round_trip() {
        for board in [Board::Mainboard, Board::Commander, Board::Sideboard] {
            assert_eq!(board.as_str().parse::<Board>().unwrap(), board);
        }
        assert!("maybeboard".parse::<Board>().is_err());
    }
}
