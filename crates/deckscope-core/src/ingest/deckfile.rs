//! Plain-text deck files
//!
//! File name: `Commander[+Partner]--Bracket--Deck Name[--Builder].txt`.
//! Body: one card per line, `N Card`, `Nx Card` or just `Card`.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::card::{Board, DeckEntry};
use crate::deck::NewDeck;
use crate::error::{DeckscopeError, Result};

static QUANTITY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)x?\s+(.+)$").expect("quantity pattern"));
static QUANTITY_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+x?\s+").expect("quantity prefix pattern"));
static SET_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[\(\[][A-Z0-9]{2,5}[\)\]].*$").expect("set suffix pattern"));
static COLLECTOR_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+\d+\s*$").expect("collector number pattern"));

/// Metadata carried by a deck file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckFileName {
    pub commander: String,
    pub partner: Option<String>,
    pub bracket: Option<u32>,
    pub deck_name: String,
    pub builder: Option<String>,
    pub warnings: Vec<String>,
}

/// Card lines of a deck file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardList {
    pub entries: Vec<DeckEntry>,
    /// Name given on a `COMMANDER:` line, if any
    pub commander: Option<String>,
}

/// A parsed deck file, ready for enrichment
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDeck {
    pub deck: NewDeck,
    pub warnings: Vec<String>,
}

pub fn parse_filename(path: &Path) -> Result<DeckFileName> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let parts: Vec<&str> = stem.split("--").map(str::trim).collect();

    if parts.len() < 2 || parts[0].is_empty() {
        return Err(DeckscopeError::InvalidDeckFileName { name: stem });
    }

    let (commander, partner) = match parts[0].split_once('+') {
        Some((first, second)) => (first.trim().to_string(), Some(second.trim().to_string())),
        None => (parts[0].to_string(), None),
    };

    let mut warnings = Vec::new();
    let bracket = match parts[1].parse::<u32>() {
        Ok(b) => {
            if !(1..=4).contains(&b) {
                warnings.push(format!("Bracket {} outside expected range 1-4", b));
            }
            Some(b)
        }
        Err(_) => {
            if !parts[1].is_empty() {
                warnings.push(format!("Could not parse bracket from '{}'", parts[1]));
            }
            None
        }
    };

    let deck_name = parts
        .get(2)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("{} Deck", commander));
    let builder = parts.get(3).filter(|s| !s.is_empty()).map(|s| s.to_string());

    Ok(DeckFileName {
        commander,
        partner,
        bracket,
        deck_name,
        builder,
        warnings,
    })
}

fn strip_quantity(name: &str) -> String {
    QUANTITY_PREFIX.replace(name.trim(), "").trim().to_string()
}

pub fn parse_card_list(text: &str) -> CardList {
    let mut list = CardList::default();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") || line.starts_with('#') || line.starts_with("---")
        {
            continue;
        }

        let upper = line.to_uppercase();
        if upper.starts_with("COMMANDER:") || upper.starts_with("COMPANION:") {
            let Some((_, rest)) = line.split_once(':') else {
                continue;
            };
            let name = strip_quantity(rest);
            if name.is_empty() {
                continue;
            }
            if upper.starts_with("COMMANDER:") {
                list.commander = Some(name.clone());
                list.entries.push(DeckEntry::new(name, 1, Board::Commander));
            } else {
                list.entries.push(DeckEntry::new(name, 1, Board::Sideboard));
            }
            continue;
        }
        if upper.starts_with("SIDEBOARD") {
            continue;
        }

        let line = match line.find(" #") {
            Some(idx) => line[..idx].trim(),
            None => line,
        };

        let (quantity, name) = match QUANTITY_LINE.captures(line) {
            Some(caps) => (caps[1].parse().unwrap_or(1), caps[2].trim().to_string()),
            None => (1, line.to_string()),
        };

        let name = SET_SUFFIX.replace(&name, "");
        let name = COLLECTOR_NUMBER.replace(&name, "");
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        list.entries.push(DeckEntry::mainboard(name, quantity));
    }

    list
}

/// Parse a deck from its file name and contents.
///
/// Commanders named in the file name end up on the commander board: moved
/// from the mainboard when listed there, added otherwise.
pub fn parse_deck(path: &Path, text: &str) -> Result<ParsedDeck> {
    let meta = parse_filename(path)?;
    let CardList {
        mut entries,
        commander: listed_commander,
    } = parse_card_list(text);

    let mut warnings = meta.warnings;
    if let Some(listed) = listed_commander.filter(|c| *c != meta.commander) {
        warnings.push(format!(
            "Commander in file '{}' differs from filename '{}', using the filename",
            listed, meta.commander
        ));
    }

    let commanders: Vec<&String> = std::iter::once(&meta.commander)
        .chain(meta.partner.as_ref())
        .collect();
    for name in commanders {
        let on_board = entries
            .iter()
            .any(|e| e.board == Board::Commander && e.name == *name);
        if on_board {
            continue;
        }
        match entries
            .iter_mut()
            .find(|e| e.board == Board::Mainboard && e.name == *name)
        {
            Some(entry) => entry.board = Board::Commander,
            None => entries.push(DeckEntry::new(name.clone(), 1, Board::Commander)),
        }
    }

    let source_file = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string());

    Ok(ParsedDeck {
        deck: NewDeck {
            name: meta.deck_name,
            source_file,
            builder: meta.builder,
            commander: meta.commander,
            partner: meta.partner,
            bracket: meta.bracket,
            entries,
        },
        warnings,
    })
}

pub fn parse_deck_file(path: &Path) -> Result<ParsedDeck> {
    let text = fs::read_to_string(path)?;
    parse_deck(path, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_filename_full() {
        let meta = parse_filename(Path::new("decks/Tymna the Weaver+Kraum Ludevic's Opus--4--Blitz--Sam.txt")).unwrap();
        assert_eq!(meta.commander, "Tymna the Weaver");
        assert_eq!(meta.partner.as_deref(), Some("Kraum Ludevic's Opus"));
        assert_eq!(meta.bracket, Some(4));
        assert_eq!(meta.deck_name, "Blitz");
        assert_eq!(meta.builder.as_deref(), Some("Sam"));
        assert!(meta.warnings.is_empty());
    }

    #[test]
    fn test_parse_filename_defaults() {
        let meta = parse_filename(Path::new("Marwyn the Nurturer--x.txt")).unwrap();
        assert_eq!(meta.bracket, None);
        assert_eq!(meta.deck_name, "Marwyn the Nurturer Deck");
        assert_eq!(meta.warnings.len(), 1);

        let meta = parse_filename(Path::new("Marwyn the Nurturer--7--Elves.txt")).unwrap();
        assert_eq!(meta.bracket, Some(7));
        assert!(meta.warnings[0].contains("outside expected range"));
    }

    #[test]
    fn test_parse_filename_invalid() {
        let err = parse_filename(Path::new("just a deck.txt")).unwrap_err();
        assert!(matches!(err, DeckscopeError::InvalidDeckFileName { .. }));
    }

    #[test]
    fn test_parse_card_list_formats() {
        let text = "\
// Ramp
# Creatures
1 Sol Ring
4x Island
Cultivate
1 Arcane Signet (C21) 234
1 Swords to Plowshares [STA]
1 Llanowar Elves # the best elf
---
COMMANDER: 1 Marwyn, the Nurturer
COMPANION: Jegantha, the Wellspring
SIDEBOARD
";
        let list = parse_card_list(text);
        let names: Vec<(&str, u32, Board)> = list
            .entries
            .iter()
            .map(|e| (e.name.as_str(), e.quantity, e.board))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Sol Ring", 1, Board::Mainboard),
                ("Island", 4, Board::Mainboard),
                ("Cultivate", 1, Board::Mainboard),
                ("Arcane Signet", 1, Board::Mainboard),
                ("Swords to Plowshares", 1, Board::Mainboard),
                ("Llanowar Elves", 1, Board::Mainboard),
                ("Marwyn, the Nurturer", 1, Board::Commander),
                ("Jegantha, the Wellspring", 1, Board::Sideboard),
            ]
        );
        assert_eq!(list.commander.as_deref(), Some("Marwyn, the Nurturer"));
    }

    #[test]
    fn test_commander_moved_from_mainboard() {
        let text = "1 Tymna the Weaver\n1 Sol Ring\n";
        let parsed = parse_deck(Path::new("Tymna the Weaver+Thrasios--3--Value.txt"), text).unwrap();
        let deck = parsed.deck;

        let commanders: Vec<&str> = deck
            .entries
            .iter()
            .filter(|e| e.board == Board::Commander)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(commanders, vec!["Tymna the Weaver", "Thrasios"]);
        assert_eq!(deck.mainboard().count(), 1);
        assert_eq!(deck.source_file.as_deref(), Some("Tymna the Weaver+Thrasios--3--Value.txt"));
    }

    #[test]
    fn test_listed_commander_mismatch_warns() {
        let text = "COMMANDER: Someone Else\n1 Sol Ring\n";
        let parsed = parse_deck(Path::new("Marwyn--2--Elves.txt"), text).unwrap();
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.deck.commander, "Marwyn");
    }

    #[test]
    fn test_parse_deck_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Marwyn, the Nurturer--2--Elves.txt");
        fs::write(&path, "1 Llanowar Elves\n1 Elvish Mystic\n").unwrap();

        let parsed = parse_deck_file(&path).unwrap();
        assert_eq!(parsed.deck.name, "Elves");
        assert_eq!(parsed.deck.entries.len(), 3);
    }
}
