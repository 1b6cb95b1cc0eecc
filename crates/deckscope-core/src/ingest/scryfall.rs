//! Scryfall over HTTP
//!
//! Downloads the oracle-cards bulk file and looks up single cards by name.
//! Requests go through the `curl` binary.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::Duration;

use serde::Deserialize;

use crate::card::CardData;
use crate::error::{DeckscopeError, Result};

use super::carddb::{card_from_json, CardLookup};

pub const SCRYFALL_API: &str = "https://api.scryfall.com";

const BULK_ENDPOINT: &str = "/bulk-data/oracle-cards";

/// Spacing between card API requests (Scryfall asks for <= 10/s)
const REQUEST_DELAY: Duration = Duration::from_millis(100);

/// curl exit status for an HTTP status >= 400 under `--fail`
const CURL_HTTP_ERROR: i32 = 22;

#[derive(Debug, Deserialize)]
struct BulkMetadata {
    download_uri: String,
}

enum Fetched {
    Body(Vec<u8>),
    HttpError,
}

fn user_agent() -> String {
    format!("deckscope/{}", env!("CARGO_PKG_VERSION"))
}

fn curl(url: &str, extra: &[&str]) -> Result<Fetched> {
    let agent = user_agent();
    let output = Command::new("curl")
        .args(["-sSL", "--fail", "-A", agent.as_str()])
        .args(extra)
        .arg(url)
        .output()
        .map_err(|e| DeckscopeError::Fetch {
            url: url.to_string(),
            message: format!("failed to run curl: {}", e),
        })?;

    if output.status.success() {
        return Ok(Fetched::Body(output.stdout));
    }
    if output.status.code() == Some(CURL_HTTP_ERROR) {
        return Ok(Fetched::HttpError);
    }
    Err(DeckscopeError::Fetch {
        url: url.to_string(),
        message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

fn fetch_body(url: &str, extra: &[&str]) -> Result<Vec<u8>> {
    match curl(url, extra)? {
        Fetched::Body(body) => Ok(body),
        Fetched::HttpError => Err(DeckscopeError::Fetch {
            url: url.to_string(),
            message: "server returned an error status".to_string(),
        }),
    }
}

fn parse_bulk_metadata(body: &[u8]) -> Result<BulkMetadata> {
    Ok(serde_json::from_slice(body)?)
}

/// Download the oracle-cards bulk file to `path`. Returns its size in bytes.
///
/// The file is written next to `path` first and renamed into place, so a
/// failed download never leaves a truncated card database behind.
pub fn download_bulk_data(path: &Path) -> Result<u64> {
    let url = format!("{}{}", SCRYFALL_API, BULK_ENDPOINT);
    let metadata = parse_bulk_metadata(&fetch_body(&url, &[])?)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let partial = path.with_extension("json.part");
    let target = partial.to_string_lossy().to_string();
    if let Err(e) = fetch_body(&metadata.download_uri, &["-o", target.as_str()]) {
        fs::remove_file(&partial).ok();
        return Err(e);
    }
    fs::rename(&partial, path)?;
    Ok(fs::metadata(path)?.len())
}

/// Card lookups against `/cards/named`, one request per name.
///
/// Answers (including misses) are cached for the lifetime of the value. The
/// first transport failure switches further lookups off.
#[derive(Debug)]
pub struct ScryfallApi {
    available: Cell<bool>,
    failure: RefCell<Option<String>>,
    cache: RefCell<HashMap<String, Option<CardData>>>,
}

impl ScryfallApi {
    pub fn new() -> Self {
        Self {
            available: Cell::new(true),
            failure: RefCell::new(None),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available.get()
    }

    /// Why lookups were switched off, if they were
    pub fn failure(&self) -> Option<String> {
        self.failure.borrow().clone()
    }

    /// `mode` is `exact` or `fuzzy`; a 404 is `Ok(None)`
    fn fetch_named(&self, name: &str, mode: &str) -> Result<Option<CardData>> {
        thread::sleep(REQUEST_DELAY);
        let url = format!("{}/cards/named", SCRYFALL_API);
        let query = format!("{}={}", mode, name);
        match curl(&url, &["-G", "--data-urlencode", query.as_str()])? {
            Fetched::Body(body) => Ok(Some(card_from_json(&String::from_utf8_lossy(&body))?)),
            Fetched::HttpError => Ok(None),
        }
    }
}

impl Default for ScryfallApi {
    fn default() -> Self {
        Self::new()
    }
}

impl CardLookup for ScryfallApi {
    fn lookup(&self, name: &str) -> Option<CardData> {
        let name = name.trim();
        if let Some(hit) = self.cache.borrow().get(name) {
            return hit.clone();
        }
        if !self.available.get() {
            return None;
        }

        let result = match self.fetch_named(name, "exact") {
            Ok(None) => self.fetch_named(name, "fuzzy"),
            other => other,
        };
        match result {
            Ok(card) => {
                self.cache
                    .borrow_mut()
                    .insert(name.to_string(), card.clone());
                card
            }
            Err(e) => {
                self.available.set(false);
                *self.failure.borrow_mut() = Some(e.to_string());
                None
            }
        }
    }
}
