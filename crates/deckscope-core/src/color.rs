//! Color identity
//!
//! A color identity is a subset of the five color symbols. Its canonical key
//! lists the present symbols in W, U, B, R, G order (`""` for colorless), and
//! is the only form decks store and compare.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DeckscopeError, Result};

/// Color symbols in canonical order.
pub const COLOR_ORDER: [Color; 5] = [Color::White, Color::Blue, Color::Black, Color::Red, Color::Green];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
}

impl Color {
    pub fn symbol(self) -> char {
        match self {
            Self::White => 'W',
            Self::Blue => 'U',
            Self::Black => 'B',
            Self::Red => 'R',
            Self::Green => 'G',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'W' => Some(Self::White),
            'U' => Some(Self::Blue),
            'B' => Some(Self::Black),
            'R' => Some(Self::Red),
            'G' => Some(Self::Green),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of colors, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorIdentity(u8);

impl ColorIdentity {
    pub const COLORLESS: Self = Self(0);
    pub const ALL: Self = Self(0b1_1111);

    pub fn from_colors<I: IntoIterator<Item = Color>>(colors: I) -> Self {
        Self(colors.into_iter().fold(0, |acc, c| acc | c.bit()))
    }

    /// Build from Scryfall-style symbol lists such as `["G", "U"]`.
    ///
    /// Unknown symbols are ignored; card data sometimes carries them.
    pub fn from_symbols<S: AsRef<str>>(symbols: &[S]) -> Self {
        Self::from_colors(
            symbols
                .iter()
                .filter_map(|s| s.as_ref().chars().next())
                .filter_map(Color::from_symbol),
        )
    }

    pub fn contains(self, color: Color) -> bool {
        self.0 & color.bit() != 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_superset_of(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_subset_of(self, other: Self) -> bool {
        other.is_superset_of(self)
    }

    pub fn is_colorless(self) -> bool {
        self.0 == 0
    }

    pub fn colors(self) -> impl Iterator<Item = Color> {
        COLOR_ORDER.into_iter().filter(move |c| self.contains(*c))
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.is_colorless()
    }

    /// Canonical key, e.g. `"UR"` for Izzet.
    pub fn key(self) -> String {
        self.colors().map(Color::symbol).collect()
    }

    /// Common name for the combination ("Izzet", "Abzan", ...).
    pub fn name(self) -> &'static str {
        match self.key().as_str() {
            "" => "Colorless",
            "W" => "White",
            "U" => "Blue",
            "B" => "Black",
            "R" => "Red",
            "G" => "Green",
            "WU" => "Azorius",
            "UB" => "Dimir",
            "BR" => "Rakdos",
            "RG" => "Gruul",
            "WG" => "Selesnya",
            "WB" => "Orzhov",
            "UR" => "Izzet",
            "BG" => "Golgari",
            "WR" => "Boros",
            "UG" => "Simic",
            "WUB" => "Esper",
            "UBR" => "Grixis",
            "BRG" => "Jund",
            "WRG" => "Naya",
            "WUG" => "Bant",
            "WBG" => "Abzan",
            "WUR" => "Jeskai",
            "UBG" => "Sultai",
            "WBR" => "Mardu",
            "URG" => "Temur",
            "UBRG" => "Glint-Eye",
            "WBRG" => "Dune",
            "WUBG" => "Witch",
            "WURG" => "Ink",
            "WUBR" => "Yore",
            _ => "Five-Color",
        }
    }
}

impl FromStr for ColorIdentity {
    type Err = DeckscopeError;

    /// Parse user input like `"ur"`, `"WBG"` or `"C"` (colorless).
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("c") {
            return Ok(Self::COLORLESS);
        }
        trimmed
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .map(|c| {
                Color::from_symbol(c).ok_or_else(|| DeckscopeError::InvalidColors {
                    input: s.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Self::from_colors)
    }
}

impl fmt::Display for ColorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_colorless() {
            write!(f, "C")
        } else {
            write!(f, "{}", self.key())
        }
    }
}

impl Serialize for ColorIdentity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for ColorIdentity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        if key.is_empty() {
            return Ok(Self::COLORLESS);
        }
        key.parse().map_err(serde::de::Error::custom)
    }
}

/// How a queried color identity is compared against a deck's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Deck identity equals the query.
    #[default]
    Exact,
    /// Deck has every queried color, possibly more.
    Contains,
    /// Deck uses only queried colors, possibly fewer.
    Subset,
}

impl ColorMode {
    pub fn matches(self, deck: ColorIdentity, query: ColorIdentity) -> bool {
        match self {
            Self::Exact => deck == query,
            Self::Contains => deck.is_superset_of(query),
            Self::Subset => deck.is_subset_of(query),
        }
    }
}
