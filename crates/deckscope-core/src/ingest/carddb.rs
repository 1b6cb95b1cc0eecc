//! Offline card database
//!
//! Loads Scryfall's oracle-cards bulk export (a JSON array of card objects)
//! and resolves deck-list names against it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::card::CardData;
use crate::color::ColorIdentity;
use crate::error::{DeckscopeError, Result};

pub const CARD_DATA_FILE: &str = "scryfall_bulk.json";

const SKIPPED_LAYOUTS: &[&str] = &["token", "double_faced_token", "emblem", "art_series"];

/// Source of card attributes by name
pub trait CardLookup {
    /// Canonical card for a deck-list name, if known
    fn lookup(&self, name: &str) -> Option<CardData>;
}

impl CardLookup for HashMap<String, CardData> {
    fn lookup(&self, name: &str) -> Option<CardData> {
        self.get(name).cloned()
    }
}

/// Tries `primary` first, then `fallback`
pub struct ChainedLookup<'a> {
    primary: &'a dyn CardLookup,
    fallback: &'a dyn CardLookup,
}

impl<'a> ChainedLookup<'a> {
    pub fn new(primary: &'a dyn CardLookup, fallback: &'a dyn CardLookup) -> Self {
        Self { primary, fallback }
    }
}

impl CardLookup for ChainedLookup<'_> {
    fn lookup(&self, name: &str) -> Option<CardData> {
        self.primary
            .lookup(name)
            .or_else(|| self.fallback.lookup(name))
    }
}

#[derive(Debug, Deserialize)]
struct BulkFace {
    #[serde(default)]
    type_line: Option<String>,
    #[serde(default)]
    oracle_text: Option<String>,
    #[serde(default)]
    mana_cost: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BulkCard {
    #[serde(default)]
    name: String,
    #[serde(default)]
    layout: String,
    #[serde(default)]
    color_identity: Vec<String>,
    #[serde(default)]
    cmc: f64,
    #[serde(default)]
    mana_cost: Option<String>,
    #[serde(default)]
    type_line: Option<String>,
    #[serde(default)]
    oracle_text: Option<String>,
    #[serde(default)]
    card_faces: Vec<BulkFace>,
}

fn join_faces<F>(faces: &[BulkFace], field: F) -> String
where
    F: Fn(&BulkFace) -> Option<&str>,
{
    faces
        .iter()
        .map(|f| field(f).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" // ")
}

impl BulkCard {
    fn into_card_data(self) -> CardData {
        let mut type_line = self.type_line.unwrap_or_default();
        let mut oracle_text = self.oracle_text.unwrap_or_default();
        let mut mana_cost = self.mana_cost.unwrap_or_default();

        if !self.card_faces.is_empty() {
            if oracle_text.is_empty() {
                oracle_text = join_faces(&self.card_faces, |f| f.oracle_text.as_deref());
            }
            if type_line.is_empty() {
                type_line = join_faces(&self.card_faces, |f| f.type_line.as_deref());
            }
            if mana_cost.is_empty() {
                mana_cost = self.card_faces[0].mana_cost.clone().unwrap_or_default();
            }
        }

        // A modal land on the back face does not make the card a land
        let front_type = type_line.split("//").next().unwrap_or("");
        CardData {
            is_land: front_type.contains("Land"),
            is_creature: type_line.contains("Creature"),
            color_identity: ColorIdentity::from_symbols(&self.color_identity),
            mana_value: self.cmc.max(0.0),
            name: self.name,
            mana_cost,
            type_line,
            oracle_text,
        }
    }
}

/// A single card object, as the card API returns it
pub(crate) fn card_from_json(json: &str) -> Result<CardData> {
    let card: BulkCard = serde_json::from_str(json)?;
    Ok(card.into_card_data())
}

fn index_key(name: &str) -> String {
    name.replace(',', "").to_lowercase()
}

/// In-memory card database with a forgiving name index
#[derive(Debug, Default)]
pub struct CardDatabase {
    cards: HashMap<String, CardData>,
    /// lowercase (and comma-stripped) name -> canonical name
    index: HashMap<String, String>,
}

impl CardDatabase {
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CARD_DATA_FILE)
    }

    /// Load the bulk file; a missing file is reported, not treated as empty
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DeckscopeError::CardDataMissing {
                path: path.to_path_buf(),
            });
        }
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let bulk: Vec<BulkCard> = serde_json::from_str(json)?;
        Ok(Self::from_cards(
            bulk.into_iter()
                .filter(|c| !c.name.is_empty() && !SKIPPED_LAYOUTS.contains(&c.layout.as_str()))
                .map(BulkCard::into_card_data),
        ))
    }

    /// Build from card records; the first record for a name wins
    pub fn from_cards<I: IntoIterator<Item = CardData>>(cards: I) -> Self {
        let mut db = Self::default();
        for card in cards {
            if db.cards.contains_key(&card.name) {
                continue;
            }
            let name = card.name.clone();
            db.index.insert(index_key(&name), name.clone());
            db.index.insert(name.to_lowercase(), name.clone());
            // Deck lists usually name double-faced cards by their front face
            if let Some((front, _)) = name.split_once(" // ") {
                db.index.entry(index_key(front)).or_insert_with(|| name.clone());
                db.index.entry(front.to_lowercase()).or_insert_with(|| name.clone());
            }
            db.cards.insert(name, card);
        }
        db
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    fn resolve(&self, name: &str) -> Option<&CardData> {
        if let Some(card) = self.cards.get(name) {
            return Some(card);
        }
        self.index
            .get(&index_key(name))
            .or_else(|| self.index.get(&name.to_lowercase()))
            .and_then(|canonical| self.cards.get(canonical))
    }
}

impl CardLookup for CardDatabase {
    fn lookup(&self, name: &str) -> Option<CardData> {
        let name = name.trim();
        self.resolve(name)
            .or_else(|| {
                // "Card Name (SET) 123" that slipped past the parser
                let clean = name.split(" (").next().unwrap_or(name).trim();
                (clean != name).then(|| self.resolve(clean)).flatten()
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BULK: &str = r#"[
        {
            "name": "Kraum, Ludevic's Opus",
            "layout": "normal",
            "color_identity": ["U", "R"],
            "cmc": 5.0,
            "mana_cost": "{3}{U}{R}",
            "type_line": "Legendary Creature — Zombie Horror",
            "oracle_text": "Flying, haste"
        },
        {
            "name": "Delver of Secrets // Insectile Aberration",
            "layout": "transform",
            "color_identity": ["U"],
            "cmc": 1.0,
            "type_line": "Creature — Human Wizard // Creature — Human Insect",
            "card_faces": [
                {"oracle_text": "At the beginning of your upkeep, look at the top card.", "mana_cost": "{U}"},
                {"oracle_text": "Flying", "mana_cost": ""}
            ]
        },
        {
            "name": "Valakut Awakening // Valakut Stoneforge",
            "layout": "modal_dfc",
            "color_identity": ["R"],
            "cmc": 3.0,
            "card_faces": [
                {"type_line": "Instant", "oracle_text": "Put any number of cards from your hand on the bottom of your library, then draw that many cards plus one."},
                {"type_line": "Land", "oracle_text": "{T}: Add {R}."}
            ]
        },
        {"name": "Treasure", "layout": "token", "type_line": "Token Artifact — Treasure"},
        {"name": "Kraum, Ludevic's Opus", "layout": "normal", "cmc": 99.0}
    ]"#;

    #[test]
    fn test_chained_lookup_prefers_primary() {
        let db = CardDatabase::from_json(BULK).unwrap();
        let mut extra = HashMap::new();
        extra.insert(
            "Sol Ring".to_string(),
            CardData {
                name: "Sol Ring".to_string(),
                mana_value: 1.0,
                ..Default::default()
            },
        );
        extra.insert(
            "Kraum, Ludevic's Opus".to_string(),
            CardData {
                name: "Kraum, Ludevic's Opus".to_string(),
                ..Default::default()
            },
        );

        let chained = ChainedLookup::new(&db, &extra);
        assert_eq!(chained.lookup("Kraum, Ludevic's Opus").unwrap().mana_value, 5.0);
        assert_eq!(chained.lookup("Sol Ring").unwrap().mana_value, 1.0);
        assert!(chained.lookup("Nothing").is_none());
    }

    #[test]
    fn test_card_from_api_json() {
        let card = card_from_json(
            r#"{"object": "card", "name": "Sol Ring", "layout": "normal", "cmc": 1.0,
                "color_identity": [], "type_line": "Artifact", "oracle_text": "{T}: Add {C}{C}."}"#,
        )
        .unwrap();
        assert_eq!(card.name, "Sol Ring");
        assert!(card.color_identity.is_colorless());
        assert!(!card.is_land);
    }

    #[test]
    fn test_skips_tokens_and_duplicates() {
        let db = CardDatabase::from_json(BULK).unwrap();
        assert_eq!(db.len(), 3);
        assert!(db.lookup("Treasure").is_none());
        assert_eq!(db.lookup("Kraum, Ludevic's Opus").unwrap().mana_value, 5.0);
    }

    #[test]
    fn test_forgiving_names() {
        let db = CardDatabase::from_json(BULK).unwrap();
        let kraum = db.lookup("kraum ludevic's opus").unwrap();
        assert_eq!(kraum.name, "Kraum, Ludevic's Opus");
        assert_eq!(kraum.color_identity.key(), "UR");
        assert!(db.lookup("Kraum, Ludevic's Opus (C20) 12").is_some());
        assert!(db.lookup("Delver of Secrets").is_some());
    }

    #[test]
    fn test_double_faced_cards() {
        let db = CardDatabase::from_json(BULK).unwrap();
        let delver = db.lookup("Delver of Secrets // Insectile Aberration").unwrap();
        assert!(delver.oracle_text.contains(" // Flying"));
        assert_eq!(delver.mana_cost, "{U}");
        assert!(delver.is_creature);

        let valakut = db.lookup("Valakut Awakening").unwrap();
        assert_eq!(valakut.type_line, "Instant // Land");
        assert!(!valakut.is_land);
    }

    #[test]
    fn test_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = CardDatabase::load(&CardDatabase::path(tmp.path())).unwrap_err();
        assert!(matches!(err, DeckscopeError::CardDataMissing { .. }));

        fs::write(CardDatabase::path(tmp.path()), BULK).unwrap();
        assert_eq!(CardDatabase::load(&CardDatabase::path(tmp.path())).unwrap().len(), 3);
    }
}
