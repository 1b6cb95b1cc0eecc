//! Deck import: parse, enrich, label, store.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::card::CardData;
use crate::category::Categorizer;
use crate::color::ColorIdentity;
use crate::deck::DeckRecord;
use crate::error::Result;
use crate::ingest::{parse_deck_file, CardLookup, ParsedDeck};
use crate::store::Store;

/// Callback type for per-file progress reporting: (status, message)
pub type ImportCallback<'a> = Option<&'a dyn Fn(&str, &str)>;

/// Not-found names listed in a warning before it is truncated
const NOT_FOUND_PREVIEW: usize = 5;

#[derive(Debug)]
pub enum ImportStatus {
    Imported(DeckRecord),
    /// Same source file already stored and not forced
    Skipped { existing_id: i64 },
}

#[derive(Debug)]
pub struct DeckImport {
    pub status: ImportStatus,
    pub enriched: usize,
    pub not_found: Vec<String>,
    pub warnings: Vec<String>,
    /// Stored decks whose statistics changed because a card was refreshed
    pub recomputed: Vec<i64>,
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: usize,
    pub deck_ids: Vec<i64>,
}

pub struct Importer<'a> {
    store: &'a mut Store,
    lookup: &'a dyn CardLookup,
    categorizer: &'a Categorizer,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a mut Store, lookup: &'a dyn CardLookup, categorizer: &'a Categorizer) -> Self {
        Self {
            store,
            lookup,
            categorizer,
        }
    }

    /// Store one parsed deck.
    ///
    /// Every known card is upserted with rule labels (manual and external
    /// labels survive) and its entry renamed to the canonical name. Unknown
    /// cards stay in the deck without metadata.
    pub fn import_deck(&mut self, parsed: ParsedDeck, force: bool) -> Result<DeckImport> {
        let ParsedDeck {
            mut deck,
            mut warnings,
        } = parsed;

        if let Some(source) = &deck.source_file {
            if let Some(existing_id) = self.store.deck_id_by_source(source)? {
                if !force {
                    return Ok(DeckImport {
                        status: ImportStatus::Skipped { existing_id },
                        enriched: 0,
                        not_found: Vec::new(),
                        warnings,
                        recomputed: Vec::new(),
                    });
                }
                self.store.delete_deck(existing_id)?;
            }
        }

        let mut resolved: HashMap<String, Option<CardData>> = HashMap::new();
        let mut enriched = 0;
        let mut not_found = Vec::new();
        let mut recomputed = BTreeSet::new();

        for entry in &mut deck.entries {
            let card = match resolved.get(&entry.name) {
                Some(card) => card.clone(),
                None => {
                    let card = self.lookup.lookup(&entry.name);
                    if let Some(card) = &card {
                        recomputed.extend(
                            self.store
                                .upsert_card(card, &self.categorizer.categorize(card))?,
                        );
                    }
                    resolved.insert(entry.name.clone(), card.clone());
                    card
                }
            };
            match card {
                Some(card) => {
                    entry.name = card.name;
                    enriched += 1;
                }
                None => not_found.push(entry.name.clone()),
            }
        }

        // Commanders follow their entries to the canonical name
        let canonical = |name: &str| -> Option<String> {
            resolved
                .get(name)
                .and_then(|c| c.as_ref())
                .map(|c| c.name.clone())
        };
        if let Some(name) = canonical(&deck.commander) {
            deck.commander = name;
        }
        if let Some(partner) = deck.partner.as_deref().and_then(canonical) {
            deck.partner = Some(partner);
        }

        if !not_found.is_empty() {
            let mut message = format!(
                "{} cards not found: {}",
                not_found.len(),
                not_found
                    .iter()
                    .take(NOT_FOUND_PREVIEW)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            if not_found.len() > NOT_FOUND_PREVIEW {
                message.push_str(&format!(" ... and {} more", not_found.len() - NOT_FOUND_PREVIEW));
            }
            warnings.push(message);
        }

        let record = self.store.insert_deck(&deck)?;
        if record.color_identity == ColorIdentity::COLORLESS && canonical(&record.commander).is_none() {
            warnings.push(format!(
                "Could not determine color identity for '{}'",
                record.commander
            ));
        }

        Ok(DeckImport {
            status: ImportStatus::Imported(record),
            enriched,
            not_found,
            warnings,
            recomputed: recomputed.into_iter().collect(),
        })
    }

    /// Import deck files one by one. A file that fails to parse is counted
    /// and reported; store failures abort.
    pub fn import_files(
        &mut self,
        paths: &[PathBuf],
        force: bool,
        on_file: ImportCallback<'_>,
    ) -> Result<ImportResult> {
        let mut result = ImportResult::default();

        for path in paths {
            let file = display_name(path);
            let parsed = match parse_deck_file(path) {
                Ok(parsed) => parsed,
                Err(e) => {
                    if let Some(f) = on_file {
                        f("ERROR", &format!("{}: {}", file, e));
                    }
                    result.errors += 1;
                    continue;
                }
            };

            let outcome = self.import_deck(parsed, force)?;
            if let Some(f) = on_file {
                for warning in &outcome.warnings {
                    f("WARN", &format!("{}: {}", file, warning));
                }
            }

            match outcome.status {
                ImportStatus::Imported(record) => {
                    if let Some(f) = on_file {
                        let mut message = format!(
                            "{} -> #{} {} [{}] ({} cards enriched)",
                            file,
                            record.id,
                            record.commander_label(),
                            record.color_identity,
                            outcome.enriched
                        );
                        if !outcome.recomputed.is_empty() {
                            message.push_str(&format!(
                                ", {} stored decks refreshed",
                                outcome.recomputed.len()
                            ));
                        }
                        f("OK", &message);
                    }
                    result.deck_ids.push(record.id);
                    result.imported += 1;
                }
                ImportStatus::Skipped { existing_id } => {
                    if let Some(f) = on_file {
                        f(
                            "SKIP",
                            &format!("{} (already imported as #{}, use --force)", file, existing_id),
                        );
                    }
                    result.skipped += 1;
                }
            }
        }

        Ok(result)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
