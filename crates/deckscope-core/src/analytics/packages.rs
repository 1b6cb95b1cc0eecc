//! Package detection
//!
//! Finds groups of cards that are played together: cards whose deck sets
//! are pairwise similar (Jaccard) at or above a threshold are greedily
//! clustered, strongest pair first.
//!
//! Pairs with equal similarity are taken in lexicographic order of their
//! (first, second) names, and candidates join a cluster in name order, so
//! the same input always yields the same packages.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::card::Board;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::filter::DeckFilter;
use crate::store::Store;

use super::{card_presence, percentage, Report};

/// Fewest decks worth clustering
pub const MIN_PACKAGE_DECKS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct PackageParams {
    /// Minimum pairwise similarity inside a package
    pub threshold: f64,
    pub min_cards: usize,
    /// Fraction of decks a card must appear in to be considered
    pub min_presence: f64,
    /// Near-universal cards never clustered
    pub auto_includes: BTreeSet<String>,
}

impl Default for PackageParams {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for PackageParams {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            threshold: config.package_threshold,
            min_cards: config.package_min_cards,
            min_presence: config.package_min_presence,
            auto_includes: config.auto_includes.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Package {
    /// Sorted by name
    pub cards: Vec<String>,
    /// Percentage of decks running every card of the package
    pub frequency: f64,
    pub deck_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageReport {
    pub color_identity: String,
    pub bracket: Option<u32>,
    pub deck_count: usize,
    pub packages: Vec<Package>,
}

/// |A ∩ B| / |A ∪ B|; 0 for two empty sets
pub fn jaccard(a: &BTreeSet<i64>, b: &BTreeSet<i64>) -> f64 {
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    }
}

/// Cluster cards by co-occurrence.
///
/// `presence` maps each card to the decks running it; `total_decks` is the
/// size of the deck set it was built from.
pub fn detect_packages(
    presence: &BTreeMap<String, BTreeSet<i64>>,
    total_decks: usize,
    params: &PackageParams,
) -> Vec<Package> {
    if total_decks == 0 {
        return Vec::new();
    }

    // Name order, which the tie-breaks below rely on
    let common: Vec<(&str, &BTreeSet<i64>)> = presence
        .iter()
        .filter(|(name, decks)| {
            decks.len() as f64 / total_decks as f64 >= params.min_presence
                && !params.auto_includes.contains(*name)
        })
        .map(|(name, decks)| (name.as_str(), decks))
        .collect();

    let mut similar: HashMap<(usize, usize), f64> = HashMap::new();
    for i in 0..common.len() {
        for j in (i + 1)..common.len() {
            let score = jaccard(common[i].1, common[j].1);
            if score >= params.threshold {
                similar.insert((i, j), score);
            }
        }
    }
    let fits = |a: usize, b: usize| similar.contains_key(&(a.min(b), a.max(b)));

    let mut pairs: Vec<((usize, usize), f64)> = similar.iter().map(|(k, v)| (*k, *v)).collect();
    pairs.sort_by(|(pa, sa), (pb, sb)| sb.total_cmp(sa).then_with(|| pa.cmp(pb)));

    let mut used = vec![false; common.len()];
    let mut packages = Vec::new();
    for ((a, b), _) in pairs {
        if used[a] && used[b] {
            continue;
        }

        let mut cluster = vec![a, b];
        for candidate in 0..common.len() {
            if used[candidate] || cluster.contains(&candidate) {
                continue;
            }
            if cluster.iter().all(|&member| fits(candidate, member)) {
                cluster.push(candidate);
            }
        }

        if cluster.len() < params.min_cards {
            continue;
        }

        cluster.sort_unstable();
        let mut shared = common[cluster[0]].1.clone();
        for &member in &cluster[1..] {
            shared = shared.intersection(common[member].1).copied().collect();
        }
        for &member in &cluster {
            used[member] = true;
        }
        packages.push(Package {
            cards: cluster.iter().map(|&i| common[i].0.to_string()).collect(),
            frequency: percentage(shared.len(), total_decks),
            deck_count: shared.len(),
        });
    }

    packages.sort_by(|x, y| {
        y.frequency
            .total_cmp(&x.frequency)
            .then_with(|| x.cards.cmp(&y.cards))
    });
    packages
}

pub fn find_packages(
    store: &Store,
    filter: &DeckFilter,
    params: &PackageParams,
) -> Result<Report<PackageReport>> {
    let deck_ids = store.matching_deck_ids(filter)?;
    if deck_ids.len() < MIN_PACKAGE_DECKS {
        return Ok(Report::no_data(
            format!(
                "Need at least {} matching decks for package detection",
                MIN_PACKAGE_DECKS
            ),
            deck_ids.len(),
        ));
    }

    let presence = card_presence(&store.deck_cards(&deck_ids, Board::Mainboard)?);
    Ok(Report::Ready(PackageReport {
        color_identity: filter.color_label(),
        bracket: filter.bracket,
        deck_count: deck_ids.len(),
        packages: detect_packages(&presence, deck_ids.len(), params),
    }))
}
