//! Deck ingestion: deck text files, builder exports and card data.

mod carddb;
mod deckfile;
pub mod export;
mod scryfall;

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub use carddb::{CardDatabase, CardLookup, ChainedLookup, CARD_DATA_FILE};
pub use deckfile::{
    parse_card_list, parse_deck, parse_deck_file, parse_filename, CardList, DeckFileName,
    ParsedDeck,
};
pub use export::{save_export, DeckMeta, SaveOptions, SavedDeck};
pub use scryfall::{download_bulk_data, ScryfallApi, SCRYFALL_API};

/// `.txt` deck files under `path` (recursive), sorted by path.
/// A file path is returned as is.
pub fn find_deck_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("txt")))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_deck_files() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("b2")).unwrap();
        fs::write(tmp.path().join("b2/Marwyn--2--Elves.txt"), "").unwrap();
        fs::write(tmp.path().join("Atraxa--4--Counters.TXT"), "").unwrap();
        fs::write(tmp.path().join("notes.md"), "").unwrap();

        let files = find_deck_files(tmp.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("Atraxa--4--Counters.TXT"));

        assert_eq!(find_deck_files(&files[1]), vec![files[1].clone()]);
    }
}
