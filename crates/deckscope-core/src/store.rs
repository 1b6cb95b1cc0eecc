//! SQLite deck store
//!
//! Holds cards, decks and deck rows, plus each deck's cached statistics.
//! Statistics are rewritten inside the same transaction as the change that
//! invalidated them, so a reader never sees a half-updated deck.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::card::{Board, Card, CardData, CategorySource};
use crate::category::CategorySet;
use crate::color::ColorIdentity;
use crate::deck::{DeckRecord, NewDeck};
use crate::error::{DeckscopeError, Result};
use crate::filter::DeckFilter;
use crate::stats::{CardFacts, DeckStats, JoinedEntry};

pub const DB_FILE: &str = "decks.db";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cards (
    name TEXT PRIMARY KEY,
    color_identity TEXT NOT NULL DEFAULT '',
    mana_value REAL NOT NULL DEFAULT 0,
    mana_cost TEXT NOT NULL DEFAULT '',
    type_line TEXT NOT NULL DEFAULT '',
    oracle_text TEXT NOT NULL DEFAULT '',
    is_land INTEGER NOT NULL DEFAULT 0,
    is_creature INTEGER NOT NULL DEFAULT 0,
    categories TEXT NOT NULL DEFAULT '["other"]',
    category_source TEXT NOT NULL DEFAULT 'rules'
);

CREATE TABLE IF NOT EXISTS decks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    source_file TEXT,
    builder TEXT,
    date_added TEXT NOT NULL,
    commander_name TEXT NOT NULL,
    partner_name TEXT,
    color_identity_key TEXT NOT NULL DEFAULT '',
    bracket INTEGER,
    commander_mana_value REAL NOT NULL DEFAULT 0,
    stats_json TEXT
);

CREATE TABLE IF NOT EXISTS deck_cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    deck_id INTEGER NOT NULL REFERENCES decks(id) ON DELETE CASCADE,
    card_name TEXT NOT NULL,
    quantity INTEGER NOT NULL DEFAULT 1 CHECK (quantity >= 1),
    board TEXT NOT NULL DEFAULT 'mainboard'
);

CREATE INDEX IF NOT EXISTS idx_deck_cards_deck ON deck_cards(deck_id);
CREATE INDEX IF NOT EXISTS idx_deck_cards_card ON deck_cards(card_name);
CREATE INDEX IF NOT EXISTS idx_decks_color ON decks(color_identity_key);
CREATE INDEX IF NOT EXISTS idx_decks_bracket ON decks(bracket);
CREATE INDEX IF NOT EXISTS idx_decks_source ON decks(source_file);
"#;

const CARD_COLUMNS: &str = "name, color_identity, mana_value, mana_cost, type_line, oracle_text, \
                            is_land, is_creature, categories, category_source";

const DECK_COLUMNS: &str = "id, name, source_file, builder, date_added, commander_name, partner_name, \
                            color_identity_key, bracket, commander_mana_value, stats_json";

/// One deck row: (deck, card, quantity) on a given board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckCardRow {
    pub deck_id: i64,
    pub card_name: String,
    pub quantity: u32,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) `decks.db` under `base_dir`
    pub fn open(base_dir: &Path) -> Result<Self> {
        fs::create_dir_all(base_dir)?;
        Self::open_path(&Self::path(base_dir))
    }

    pub fn open_path(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(DB_FILE)
    }

    // =========================================================================
    // Cards
    // =========================================================================

    /// Insert or refresh a card. Labels are replaced only while they still
    /// come from the rules; manual and external labels are kept.
    ///
    /// When the refresh changes anything the statistics read (labels, mana
    /// value, land or creature flags, type line), every deck already running
    /// the card is recomputed in the same transaction. Returns those deck ids.
    pub fn upsert_card(&self, card: &CardData, categories: &CategorySet) -> Result<Vec<i64>> {
        let labels = serde_json::to_string(categories)?;
        let tx = self.conn.unchecked_transaction()?;
        let before = stats_facts(&tx, &card.name)?;
        tx.execute(
            "INSERT INTO cards (name, color_identity, mana_value, mana_cost, type_line, oracle_text,
                                is_land, is_creature, categories, category_source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'rules')
             ON CONFLICT(name) DO UPDATE SET
                color_identity = excluded.color_identity,
                mana_value = excluded.mana_value,
                mana_cost = excluded.mana_cost,
                type_line = excluded.type_line,
                oracle_text = excluded.oracle_text,
                is_land = excluded.is_land,
                is_creature = excluded.is_creature,
                categories = CASE WHEN cards.category_source = 'rules'
                                  THEN excluded.categories ELSE cards.categories END",
            params![
                card.name,
                card.color_identity.key(),
                card.mana_value,
                card.mana_cost,
                card.type_line,
                card.oracle_text,
                card.is_land,
                card.is_creature,
                labels,
            ],
        )?;

        let mut affected = Vec::new();
        if stats_facts(&tx, &card.name)? != before {
            affected = decks_running(&tx, &card.name)?;
            for id in &affected {
                store_stats(&tx, *id)?;
            }
        }
        tx.commit()?;
        Ok(affected)
    }

    pub fn card(&self, name: &str) -> Result<Option<Card>> {
        let sql = format!("SELECT {} FROM cards WHERE name = ?1", CARD_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![name], card_from_row)
            .optional()?)
    }

    /// Exact name, then case-insensitive, then the shortest partial match
    pub fn find_card(&self, query: &str) -> Result<Option<Card>> {
        if let Some(card) = self.card(query)? {
            return Ok(Some(card));
        }
        let sql = format!(
            "SELECT {} FROM cards WHERE name = ?1 COLLATE NOCASE \
             OR name LIKE '%' || ?1 || '%' \
             ORDER BY (name = ?1 COLLATE NOCASE) DESC, length(name), name LIMIT 1",
            CARD_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![query], card_from_row)
            .optional()?)
    }

    /// Cards by name; names without a record are absent from the map
    pub fn cards_named<'a, I>(&self, names: I) -> Result<HashMap<String, Card>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let sql = format!("SELECT {} FROM cards WHERE name = ?1", CARD_COLUMNS);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let mut cards = HashMap::new();
        for name in names {
            if let Some(card) = stmt.query_row(params![name], card_from_row).optional()? {
                cards.insert(card.data.name.clone(), card);
            }
        }
        Ok(cards)
    }

    pub fn all_cards(&self) -> Result<Vec<Card>> {
        let sql = format!("SELECT {} FROM cards ORDER BY name", CARD_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let cards = stmt
            .query_map([], card_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    /// Rule-labelled cards stuck at `{other}` that have text worth sending out
    pub fn uncategorized_cards(&self, limit: usize) -> Result<Vec<Card>> {
        let sql = format!(
            "SELECT {} FROM cards
             WHERE category_source = 'rules' AND categories = '[\"other\"]' AND oracle_text != ''
             ORDER BY name LIMIT ?1",
            CARD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let cards = stmt
            .query_map(params![limit as i64], card_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    /// Replace a card's labels and rebuild the stats of every deck that runs
    /// it, as one transaction. Returns the affected deck ids.
    pub fn set_card_categories(
        &mut self,
        name: &str,
        categories: &CategorySet,
        source: CategorySource,
    ) -> Result<Vec<i64>> {
        let labels = serde_json::to_string(categories)?;
        let tx = self.conn.transaction()?;

        let updated = tx.execute(
            "UPDATE cards SET categories = ?1, category_source = ?2 WHERE name = ?3",
            params![labels, source.as_str(), name],
        )?;
        if updated == 0 {
            return Err(DeckscopeError::CardNotFound {
                name: name.to_string(),
            });
        }

        let deck_ids = decks_running(&tx, name)?;
        for id in &deck_ids {
            store_stats(&tx, *id)?;
        }
        tx.commit()?;
        Ok(deck_ids)
    }

    /// Apply external labels in one transaction. Manually labelled cards are
    /// left alone. Returns (cards updated, decks recomputed).
    pub fn apply_external_categories(
        &mut self,
        updates: &[(String, CategorySet)],
    ) -> Result<(usize, Vec<i64>)> {
        let tx = self.conn.transaction()?;
        let mut updated = 0;
        let mut affected = BTreeSet::new();

        for (name, categories) in updates {
            let labels = serde_json::to_string(categories)?;
            let changed = tx.execute(
                "UPDATE cards SET categories = ?1, category_source = 'external'
                 WHERE name = ?2 AND category_source != 'manual'",
                params![labels, name],
            )?;
            if changed > 0 {
                updated += 1;
                affected.extend(decks_running(&tx, name)?);
            }
        }

        for id in &affected {
            store_stats(&tx, *id)?;
        }
        tx.commit()?;
        Ok((updated, affected.into_iter().collect()))
    }

    // =========================================================================
    // Decks
    // =========================================================================

    /// Store a deck and compute its statistics.
    ///
    /// The color identity is the union of the stored commander cards'
    /// identities and the commander mana value is the primary commander's;
    /// commanders without a card record contribute nothing.
    pub fn insert_deck(&mut self, deck: &NewDeck) -> Result<DeckRecord> {
        let tx = self.conn.transaction()?;

        let mut identity = ColorIdentity::COLORLESS;
        let mut commander_mana_value = 0.0;
        for (i, name) in deck.commander_names().into_iter().enumerate() {
            let row: Option<(String, f64)> = tx
                .query_row(
                    "SELECT color_identity, mana_value FROM cards WHERE name = ?1",
                    params![name],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            if let Some((key, mana_value)) = row {
                identity = identity.union(parse_color_key(&key));
                if i == 0 {
                    commander_mana_value = mana_value;
                }
            }
        }

        tx.execute(
            "INSERT INTO decks (name, source_file, builder, date_added, commander_name, partner_name,
                                color_identity_key, bracket, commander_mana_value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                deck.name,
                deck.source_file,
                deck.builder,
                chrono::Utc::now().to_rfc3339(),
                deck.commander,
                deck.partner,
                identity.key(),
                deck.bracket,
                commander_mana_value,
            ],
        )?;
        let id = tx.last_insert_rowid();

        {
            let mut insert = tx.prepare(
                "INSERT INTO deck_cards (deck_id, card_name, quantity, board) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for entry in &deck.entries {
                insert.execute(params![id, entry.name, entry.quantity.max(1), entry.board.as_str()])?;
            }
        }

        store_stats(&tx, id)?;
        tx.commit()?;

        self.deck(id)?.ok_or(DeckscopeError::DeckNotFound { id })
    }

    /// Recompute one deck's statistics
    pub fn update_deck_stats(&mut self, deck_id: i64) -> Result<DeckStats> {
        let tx = self.conn.transaction()?;
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM decks WHERE id = ?1)",
            params![deck_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(DeckscopeError::DeckNotFound { id: deck_id });
        }
        let stats = store_stats(&tx, deck_id)?;
        tx.commit()?;
        Ok(stats)
    }

    /// Recompute every deck, one transaction per deck
    pub fn recompute_all_stats(&mut self) -> Result<usize> {
        let ids: Vec<i64> = {
            let mut stmt = self.conn.prepare("SELECT id FROM decks ORDER BY id")?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            ids
        };
        for id in &ids {
            self.update_deck_stats(*id)?;
        }
        Ok(ids.len())
    }

    pub fn deck_id_by_source(&self, source_file: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM decks WHERE source_file = ?1 ORDER BY id LIMIT 1",
                params![source_file],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Remove a deck and its rows. Returns false when it did not exist.
    pub fn delete_deck(&mut self, id: i64) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM decks WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    pub fn deck(&self, id: i64) -> Result<Option<DeckRecord>> {
        let sql = format!("SELECT {} FROM decks WHERE id = ?1", DECK_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], deck_from_row)
            .optional()?)
    }

    /// All decks, newest first
    pub fn decks(&self) -> Result<Vec<DeckRecord>> {
        let sql = format!(
            "SELECT {} FROM decks ORDER BY date_added DESC, id DESC",
            DECK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let decks = stmt
            .query_map([], deck_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(decks)
    }

    /// Decks satisfying `filter`, newest first
    pub fn matching_decks(&self, filter: &DeckFilter) -> Result<Vec<DeckRecord>> {
        Ok(self
            .decks()?
            .into_iter()
            .filter(|d| filter.matches(d))
            .collect())
    }

    pub fn matching_deck_ids(&self, filter: &DeckFilter) -> Result<Vec<i64>> {
        Ok(filter.resolve(&self.decks()?))
    }

    /// Rows on `board` for the given decks
    pub fn deck_cards(&self, deck_ids: &[i64], board: Board) -> Result<Vec<DeckCardRow>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT deck_id, card_name, quantity FROM deck_cards
             WHERE deck_id = ?1 AND board = ?2 ORDER BY id",
        )?;
        let mut rows = Vec::new();
        for id in deck_ids {
            let deck_rows = stmt
                .query_map(params![id, board.as_str()], |row| {
                    Ok(DeckCardRow {
                        deck_id: row.get(0)?,
                        card_name: row.get(1)?,
                        quantity: quantity_from_db(row.get(2)?),
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.extend(deck_rows);
        }
        Ok(rows)
    }

    /// Distinct card names across every deck row
    pub fn unique_card_count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT card_name) FROM deck_cards",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

// =============================================================================
// Row mapping and shared transaction steps
// =============================================================================

fn parse_color_key(key: &str) -> ColorIdentity {
    key.parse().unwrap_or(ColorIdentity::COLORLESS)
}

fn parse_labels(json: &str) -> CategorySet {
    serde_json::from_str(json).unwrap_or_default()
}

fn quantity_from_db(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(1).max(1)
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    let key: String = row.get(1)?;
    let labels: String = row.get(8)?;
    let source: String = row.get(9)?;
    Ok(Card {
        data: CardData {
            name: row.get(0)?,
            color_identity: parse_color_key(&key),
            mana_value: row.get(2)?,
            mana_cost: row.get(3)?,
            type_line: row.get(4)?,
            oracle_text: row.get(5)?,
            is_land: row.get(6)?,
            is_creature: row.get(7)?,
        },
        categories: parse_labels(&labels),
        category_source: CategorySource::from_db(&source),
    })
}

fn deck_from_row(row: &Row<'_>) -> rusqlite::Result<DeckRecord> {
    let key: String = row.get(7)?;
    let bracket: Option<i64> = row.get(8)?;
    let stats_json: Option<String> = row.get(10)?;
    Ok(DeckRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        source_file: row.get(2)?,
        builder: row.get(3)?,
        date_added: row.get(4)?,
        commander: row.get(5)?,
        partner: row.get(6)?,
        color_identity: parse_color_key(&key),
        bracket: bracket.and_then(|b| u32::try_from(b).ok()),
        commander_mana_value: row.get(9)?,
        stats: stats_json.and_then(|json| serde_json::from_str(&json).ok()),
    })
}

/// The card columns that feed `DeckStats`
type StatsFacts = (f64, String, bool, bool, String);

fn stats_facts(conn: &Connection, card_name: &str) -> Result<Option<StatsFacts>> {
    Ok(conn
        .query_row(
            "SELECT mana_value, type_line, is_land, is_creature, categories FROM cards WHERE name = ?1",
            params![card_name],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .optional()?)
}

fn decks_running(conn: &Connection, card_name: &str) -> Result<Vec<i64>> {
    let mut stmt =
        conn.prepare_cached("SELECT DISTINCT deck_id FROM deck_cards WHERE card_name = ?1 ORDER BY deck_id")?;
    let ids = stmt
        .query_map(params![card_name], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}

fn joined_entries(conn: &Connection, deck_id: i64) -> Result<Vec<JoinedEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT dc.quantity, dc.board, c.name IS NOT NULL, c.mana_value, c.type_line,
                c.is_land, c.is_creature, c.categories
         FROM deck_cards dc
         LEFT JOIN cards c ON dc.card_name = c.name
         WHERE dc.deck_id = ?1",
    )?;
    let entries = stmt
        .query_map(params![deck_id], |row| {
            let board: String = row.get(1)?;
            let has_card: bool = row.get(2)?;
            let facts = if has_card {
                let labels: String = row.get(7)?;
                Some(CardFacts {
                    mana_value: row.get(3)?,
                    type_line: row.get(4)?,
                    is_land: row.get(5)?,
                    is_creature: row.get(6)?,
                    categories: parse_labels(&labels),
                })
            } else {
                None
            };
            Ok(JoinedEntry {
                quantity: quantity_from_db(row.get(0)?),
                // Unknown boards stay out of the statistics
                board: board.parse().unwrap_or(Board::Sideboard),
                facts,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

fn store_stats(conn: &Connection, deck_id: i64) -> Result<DeckStats> {
    let stats = DeckStats::compute(&joined_entries(conn, deck_id)?);
    conn.execute(
        "UPDATE decks SET stats_json = ?1 WHERE id = ?2",
        params![serde_json::to_string(&stats)?, deck_id],
    )?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::DeckEntry;
    use crate::category::{categorize, Category};
    use tempfile::TempDir;

    fn card(name: &str, colors: &str, mv: f64, type_line: &str, oracle: &str) -> CardData {
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

    fn seed(store: &Store) {
        for c in [
            card("Tymna the Weaver", "WB", 3.0, "Legendary Creature — Human Cleric", ""),
            card("Kraum, Ludevic's Opus", "UR", 5.0, "Legendary Creature — Zombie Horror", ""),
            card("Island", "", 0.0, "Basic Land — Island", "({T}: Add {U}.)"),
            card("Counterspell", "U", 2.0, "Instant", "Counter target spell."),
            card("Grizzly Bears", "G", 2.0, "Creature — Bear", ""),
        ] {
            store.upsert_card(&c, &categorize(&c)).unwrap();
        }
    }

    fn partner_deck() -> NewDeck {
        NewDeck {
            name: "Blitz".to_string(),
            source_file: Some("blitz.txt".to_string()),
            commander: "Tymna the Weaver".to_string(),
            partner: Some("Kraum, Ludevic's Opus".to_string()),
            bracket: Some(4),
            entries: vec![
                DeckEntry::new("Tymna the Weaver", 1, Board::Commander),
                DeckEntry::new("Kraum, Ludevic's Opus", 1, Board::Commander),
                DeckEntry::mainboard("Island", 10),
                DeckEntry::mainboard("Counterspell", 1),
                DeckEntry::mainboard("Unknown Card", 2),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_derives_identity_and_stats() {
        let mut store = Store::open_in_memory().unwrap();
        seed(&store);
        let deck = store.insert_deck(&partner_deck()).unwrap();

        assert_eq!(deck.color_identity.key(), "WUBR");
        assert_eq!(deck.commander_mana_value, 3.0);
        let stats = deck.stats.unwrap();
        assert_eq!(stats.total_cards, 13);
        assert_eq!(stats.land_count, 10);
        assert_eq!(stats.curve[0], 2);
        assert_eq!(stats.curve[2], 1);
        assert_eq!(stats.category_count(Category::Counterspell), 1);
    }

    #[test]
    fn test_missing_commander_is_colorless() {
        let mut store = Store::open_in_memory().unwrap();
        let deck = store
            .insert_deck(&NewDeck {
                name: "Mystery".to_string(),
                commander: "Nobody".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert!(deck.color_identity.is_colorless());
        assert_eq!(deck.stats.unwrap().total_cards, 0);
    }

    #[test]
    fn test_manual_edit_recomputes_affected_decks() {
        let mut store = Store::open_in_memory().unwrap();
        seed(&store);
        let deck = store.insert_deck(&partner_deck()).unwrap();

        let affected = store
            .set_card_categories(
                "Counterspell",
                &CategorySet::new([Category::Protection]),
                CategorySource::Manual,
            )
            .unwrap();
        assert_eq!(affected, vec![deck.id]);

        let stats = store.deck(deck.id).unwrap().unwrap().stats.unwrap();
        assert_eq!(stats.category_count(Category::Counterspell), 0);
        assert_eq!(stats.category_count(Category::Protection), 1);
    }

    #[test]
    fn test_manual_edit_unknown_card() {
        let mut store = Store::open_in_memory().unwrap();
        let err = store
            .set_card_categories("Nope", &CategorySet::other(), CategorySource::Manual)
            .unwrap_err();
        assert!(matches!(err, DeckscopeError::CardNotFound { .. }));
    }

    #[test]
    fn test_upsert_keeps_manual_labels() {
        let mut store = Store::open_in_memory().unwrap();
        seed(&store);
        store
            .set_card_categories(
                "Grizzly Bears",
                &CategorySet::new([Category::Removal]),
                CategorySource::Manual,
            )
            .unwrap();

        let bears = card("Grizzly Bears", "G", 2.0, "Creature — Bear", "");
        store.upsert_card(&bears, &categorize(&bears)).unwrap();

        let stored = store.card("Grizzly Bears").unwrap().unwrap();
        assert!(stored.categories.contains(Category::Removal));
        assert_eq!(stored.category_source, CategorySource::Manual);
    }

    #[test]
    fn test_upsert_recomputes_decks_running_card() {
        let mut store = Store::open_in_memory().unwrap();
        seed(&store);
        let deck = store.insert_deck(&partner_deck()).unwrap();

        let unchanged = card("Counterspell", "U", 2.0, "Instant", "Counter target spell.");
        assert!(store.upsert_card(&unchanged, &categorize(&unchanged)).unwrap().is_empty());

        let retyped = card("Counterspell", "U", 2.0, "Instant", "Counter target spell.");
        let affected = store
            .upsert_card(&retyped, &CategorySet::new([Category::Removal]))
            .unwrap();
        assert_eq!(affected, vec![deck.id]);
        let stats = store.deck(deck.id).unwrap().unwrap().stats.unwrap();
        assert_eq!(stats.category_count(Category::Counterspell), 0);
        assert_eq!(stats.category_count(Category::Removal), 1);

        // Previously unknown card gains a record
        let found = card("Unknown Card", "U", 4.0, "Sorcery", "Draw two cards.");
        let affected = store.upsert_card(&found, &categorize(&found)).unwrap();
        assert_eq!(affected, vec![deck.id]);
        let stats = store.deck(deck.id).unwrap().unwrap().stats.unwrap();
        assert_eq!(stats.curve[4], 2);
    }

    #[test]
    fn test_external_never_overrides_manual() {
        let mut store = Store::open_in_memory().unwrap();
        seed(&store);
        store
            .set_card_categories("Grizzly Bears", &CategorySet::new([Category::Tutor]), CategorySource::Manual)
            .unwrap();

        let (updated, _) = store
            .apply_external_categories(&[("Grizzly Bears".to_string(), CategorySet::new([Category::Draw]))])
            .unwrap();
        assert_eq!(updated, 0);
        assert!(store.card("Grizzly Bears").unwrap().unwrap().categories.contains(Category::Tutor));
    }

    #[test]
    fn test_uncategorized_requires_text() {
        let store = Store::open_in_memory().unwrap();
        let vanilla = card("Grizzly Bears", "G", 2.0, "Creature — Bear", "");
        let texty = card("Llanowar Visionary", "G", 3.0, "Creature — Elf Druid", "When this enters, you feel lucky.");
        for c in [&vanilla, &texty] {
            store.upsert_card(c, &categorize(c)).unwrap();
        }
        let pending = store.uncategorized_cards(10).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].data.name, "Llanowar Visionary");
    }

    #[test]
    fn test_find_card_partial() {
        let store = Store::open_in_memory().unwrap();
        seed(&store);
        assert_eq!(store.find_card("counterspell").unwrap().unwrap().data.name, "Counterspell");
        assert_eq!(store.find_card("Kraum").unwrap().unwrap().data.name, "Kraum, Ludevic's Opus");
        assert!(store.find_card("Zzyzx").unwrap().is_none());
    }

    #[test]
    fn test_delete_cascades() {
        let mut store = Store::open_in_memory().unwrap();
        seed(&store);
        let deck = store.insert_deck(&partner_deck()).unwrap();
        assert_eq!(store.deck_id_by_source("blitz.txt").unwrap(), Some(deck.id));
        assert!(store.delete_deck(deck.id).unwrap());
        assert!(store.deck_cards(&[deck.id], Board::Mainboard).unwrap().is_empty());
        assert_eq!(store.unique_card_count().unwrap(), 0);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut store = Store::open_in_memory().unwrap();
        seed(&store);
        let deck = store.insert_deck(&partner_deck()).unwrap();
        let first = store.update_deck_stats(deck.id).unwrap();
        assert_eq!(store.recompute_all_stats().unwrap(), 1);
        let second = store.deck(deck.id).unwrap().unwrap().stats.unwrap();
        assert_eq!(first, second);
        assert!(matches!(
            store.update_deck_stats(999),
            Err(DeckscopeError::DeckNotFound { id: 999 })
        ));
    }

    #[test]
    fn test_file_store_persists() {
        let tmp = TempDir::new().unwrap();
        {
            let mut store = Store::open(tmp.path()).unwrap();
            seed(&store);
            store.insert_deck(&partner_deck()).unwrap();
        }
        let store = Store::open(tmp.path()).unwrap();
        assert_eq!(store.decks().unwrap().len(), 1);
        assert!(Store::path(tmp.path()).exists());
    }
}
