//! Deck-builder exports
//!
//! Turns a Moxfield text export (MTGO/Arena style, with or without section
//! headers) into a deck file named after its commander.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DeckscopeError, Result};

static QUANTITY_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+x?\s+").expect("quantity prefix pattern"));
static SET_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[\(\[][A-Z0-9]{2,5}[\)\]].*$").expect("set suffix pattern"));
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[<>|?*]").expect("unsafe chars pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

const COMMANDER_HEADERS: &[&str] = &["COMMANDER", "COMMANDERS", "COMMANDER(S)"];
const KEPT_HEADERS: &[&str] = &["MAINBOARD", "DECK", "SIDEBOARD", "COMPANION"];
const DROPPED_HEADERS: &[&str] = &["MAYBEBOARD", "CONSIDERING"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Commander,
    Kept,
    Dropped,
}

/// Section a header line opens, if it is one (`DECK`, `// Deck`, ...)
fn section_header(line: &str) -> Option<Section> {
    let upper = line.trim().to_uppercase();
    let name = upper.strip_prefix("//").map(str::trim).unwrap_or(&upper);
    if COMMANDER_HEADERS.contains(&name) {
        Some(Section::Commander)
    } else if KEPT_HEADERS.contains(&name) {
        Some(Section::Kept)
    } else if DROPPED_HEADERS.contains(&name) {
        Some(Section::Dropped)
    } else {
        None
    }
}

fn card_name(line: &str) -> String {
    let name = QUANTITY_PREFIX.replace(line.trim(), "");
    SET_SUFFIX.replace(&name, "").trim().to_string()
}

/// Commander and partner of an export.
///
/// The first two cards of a commander section win. Without one, the first
/// card line is taken as the commander (MTGO exports list it first).
pub fn detect_commander(text: &str) -> (Option<String>, Option<String>) {
    let mut in_commander = false;
    let mut commanders = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if let Some(section) = section_header(line) {
            in_commander = section == Section::Commander;
            continue;
        }
        if in_commander && !line.is_empty() {
            let name = card_name(line);
            if !name.is_empty() {
                commanders.push(name);
            }
        }
    }

    if commanders.is_empty() {
        let first = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with("//") && !l.starts_with('#'))
            .map(card_name)
            .find(|name| !name.is_empty());
        return (first, None);
    }

    let mut names = commanders.into_iter();
    (names.next(), names.next())
}

/// Card lines of an export: headers removed, maybeboard and considering
/// sections dropped, blank lines squeezed out.
pub fn extract_mainboard(text: &str) -> String {
    let mut dropped = false;
    let mut lines = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if let Some(section) = section_header(line) {
            dropped = section == Section::Dropped;
            continue;
        }
        if !dropped && !line.is_empty() {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Make a name safe for a file name while keeping it readable
pub fn sanitize_filename(name: &str) -> String {
    let name = name
        .replace(',', "")
        .replace(['/', '\\'], "-")
        .replace(':', " -")
        .replace('"', "'");
    let name = UNSAFE_CHARS.replace_all(&name, "");
    let name = WHITESPACE.replace_all(&name, " ");
    // "--" separates the file name fields
    let mut name = name.trim().to_string();
    while name.contains("--") {
        name = name.replace("--", "-");
    }
    name
}

/// What a saved deck file is named after
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckMeta {
    pub commander: String,
    pub partner: Option<String>,
    pub bracket: Option<u32>,
    pub deck_name: Option<String>,
    pub builder: Option<String>,
}

/// `Commander[+Partner]--Bracket--Name[--Builder].txt`
///
/// An unknown bracket leaves its field empty; a missing name becomes `Deck`.
pub fn build_filename(meta: &DeckMeta) -> String {
    let mut commander = sanitize_filename(&meta.commander);
    if let Some(partner) = &meta.partner {
        commander.push('+');
        commander.push_str(&sanitize_filename(partner));
    }

    let mut parts = vec![
        commander,
        meta.bracket.map(|b| b.to_string()).unwrap_or_default(),
        meta.deck_name
            .as_deref()
            .map(sanitize_filename)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Deck".to_string()),
    ];
    if let Some(builder) = meta.builder.as_deref().map(sanitize_filename) {
        if !builder.is_empty() {
            parts.push(builder);
        }
    }
    format!("{}.txt", parts.join("--"))
}

/// `dir/filename`, or `dir/stem (N).txt` for the first free N >= 2
pub fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let path = dir.join(filename);
    if !path.exists() {
        return path;
    }
    let stem = filename.strip_suffix(".txt").unwrap_or(filename);
    (2..)
        .map(|i| dir.join(format!("{} ({}).txt", stem, i)))
        .find(|p| !p.exists())
        .unwrap_or(path)
}

/// Options for saving exports; unset fields are detected or left out
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub commander: Option<String>,
    pub partner: Option<String>,
    pub bracket: Option<u32>,
    pub deck_name: Option<String>,
    pub builder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDeck {
    pub path: PathBuf,
    pub meta: DeckMeta,
}

/// Write one export as a deck file in `output_dir`. `input` names the
/// export in errors.
pub fn save_export(
    text: &str,
    input: &str,
    options: &SaveOptions,
    output_dir: &Path,
) -> Result<SavedDeck> {
    let (detected, detected_partner) = detect_commander(text);
    let (commander, partner) = match &options.commander {
        Some(commander) => (Some(commander.clone()), options.partner.clone()),
        None => (detected, options.partner.clone().or(detected_partner)),
    };
    let commander = commander
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| DeckscopeError::CommanderNotDetected {
            input: input.to_string(),
        })?;

    let meta = DeckMeta {
        commander,
        partner,
        bracket: options.bracket,
        deck_name: options.deck_name.clone(),
        builder: options.builder.clone(),
    };

    fs::create_dir_all(output_dir)?;
    let path = unique_path(output_dir, &build_filename(&meta));
    fs::write(&path, format!("{}\n", extract_mainboard(text)))?;
    Ok(SavedDeck { path, meta })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{parse_deck_file, parse_filename};
    use tempfile::TempDir;

    const SECTIONED: &str = "COMMANDER\n1 Tymna the Weaver (C16) 48\n1 Kraum, Ludevic's Opus\n\n\
                             MAINBOARD\n1 Sol Ring\n1x Arcane Signet [ELD]\n\n\
                             MAYBEBOARD\n1 Grizzly Bears\n\nSIDEBOARD\n1 Pyroblast\n";

    #[test]
    fn test_detect_commander_section() {
        let (commander, partner) = detect_commander(SECTIONED);
        assert_eq!(commander.as_deref(), Some("Tymna the Weaver"));
        assert_eq!(partner.as_deref(), Some("Kraum, Ludevic's Opus"));

        let slashed = "// Commander\n1 Marwyn, the Nurturer\n// Deck\n1 Llanowar Elves\n";
        assert_eq!(
            detect_commander(slashed),
            (Some("Marwyn, the Nurturer".to_string()), None)
        );
    }

    #[test]
    fn test_detect_commander_first_line() {
        let mtgo = "// exported\n1 Ezuri, Renegade Leader\n\n1 Llanowar Elves\n";
        assert_eq!(
            detect_commander(mtgo).0.as_deref(),
            Some("Ezuri, Renegade Leader")
        );
        assert_eq!(detect_commander("\n// nothing\n"), (None, None));
    }

    #[test]
    fn test_extract_mainboard_drops_maybeboard() {
        let cards = extract_mainboard(SECTIONED);
        assert_eq!(
            cards,
            "1 Tymna the Weaver (C16) 48\n1 Kraum, Ludevic's Opus\n1 Sol Ring\n\
             1x Arcane Signet [ELD]\n1 Pyroblast"
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Kraum, Ludevic's Opus"), "Kraum Ludevic's Opus");
        assert_eq!(sanitize_filename("Fire // Ice"), "Fire - Ice");
        assert_eq!(sanitize_filename("Wheels: \"Turbo\"?"), "Wheels - 'Turbo'");
        assert_eq!(sanitize_filename("  a   b--c "), "a b-c");
    }

    #[test]
    fn test_build_filename_parses_back() {
        let meta = DeckMeta {
            commander: "Tymna the Weaver".to_string(),
            partner: Some("Kraum, Ludevic's Opus".to_string()),
            bracket: Some(4),
            deck_name: Some("Blitz".to_string()),
            builder: Some("CovertGoBlue".to_string()),
        };
        let name = build_filename(&meta);
        assert_eq!(name, "Tymna the Weaver+Kraum Ludevic's Opus--4--Blitz--CovertGoBlue.txt");

        let parsed = parse_filename(Path::new(&name)).unwrap();
        assert_eq!(parsed.partner.as_deref(), Some("Kraum Ludevic's Opus"));
        assert_eq!(parsed.bracket, Some(4));
        assert_eq!(parsed.builder.as_deref(), Some("CovertGoBlue"));

        let bare = build_filename(&DeckMeta {
            commander: "Marwyn, the Nurturer".to_string(),
            ..Default::default()
        });
        assert_eq!(bare, "Marwyn the Nurturer----Deck.txt");
        let parsed = parse_filename(Path::new(&bare)).unwrap();
        assert_eq!(parsed.bracket, None);
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.deck_name, "Deck");
    }

    #[test]
    fn test_save_never_overwrites() {
        let tmp = TempDir::new().unwrap();
        let options = SaveOptions {
            bracket: Some(3),
            deck_name: Some("Blitz".to_string()),
            ..Default::default()
        };

        let first = save_export(SECTIONED, "export.txt", &options, tmp.path()).unwrap();
        let second = save_export(SECTIONED, "export.txt", &options, tmp.path()).unwrap();
        let third = save_export(SECTIONED, "export.txt", &options, tmp.path()).unwrap();

        assert!(first.path.ends_with("Tymna the Weaver+Kraum Ludevic's Opus--3--Blitz.txt"));
        assert!(second.path.ends_with("Tymna the Weaver+Kraum Ludevic's Opus--3--Blitz (2).txt"));
        assert!(third.path.ends_with("Tymna the Weaver+Kraum Ludevic's Opus--3--Blitz (3).txt"));

        let written = fs::read_to_string(&first.path).unwrap();
        assert!(!written.contains("Grizzly Bears"));
        assert!(written.ends_with("1 Pyroblast\n"));
    }

    #[test]
    fn test_saved_file_imports() {
        let tmp = TempDir::new().unwrap();
        let saved = save_export(SECTIONED, "export.txt", &SaveOptions::default(), tmp.path()).unwrap();
        let parsed = parse_deck_file(&saved.path).unwrap();
        assert_eq!(parsed.deck.commander, "Tymna the Weaver");
        assert_eq!(parsed.deck.partner.as_deref(), Some("Kraum Ludevic's Opus"));
        assert!(parsed.deck.entries.iter().any(|e| e.name == "Sol Ring"));
    }

    #[test]
    fn test_commander_override_and_missing() {
        let tmp = TempDir::new().unwrap();
        let options = SaveOptions {
            commander: Some("Ezuri, Renegade Leader".to_string()),
            ..Default::default()
        };
        let saved = save_export("1 Llanowar Elves\n", "paste", &options, tmp.path()).unwrap();
        assert_eq!(saved.meta.commander, "Ezuri, Renegade Leader");
        assert_eq!(saved.meta.partner, None);

        let err = save_export("\n\n", "empty.txt", &SaveOptions::default(), tmp.path()).unwrap_err();
        assert!(matches!(err, DeckscopeError::CommanderNotDetected { .. }));
    }
}
