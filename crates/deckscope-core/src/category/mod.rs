//! # Category Module
//!
//! Maps a card's free-text abilities to functional roles such as `ramp`,
//! `removal` or `board_wipe`. Labels are not exclusive: a card gets every
//! category one of whose patterns matches its oracle text.
//!
//! ## Module layout
//!
//! - `builtin`: label vocabulary, rule table, curated staples
//! - `store`: runtime rule table (builtin + configured patterns)
//! - `classifier`: compiled rules and the `categorize` entry point
//! - `external`: optional outside classifier for `other`-only cards
//! - `cache`: on-disk cache of external answers
//!
//! ## Example
//!
//! ```rust
//! use deckscope_core::card::CardData;
//! use deckscope_core::category::{categorize, Category};
//!
//! let card = CardData {
//!     name: "Swords to Plowshares".to_string(),
//!     type_line: "Instant".to_string(),
//!     oracle_text: "Exile target creature. Its controller gains life equal to its power.".to_string(),
//!     ..Default::default()
//! };
//! let labels = categorize(&card);
//! assert!(labels.contains(Category::Removal));
//! ```

mod builtin;
mod cache;
mod classifier;
mod external;
mod store;

// Re-exports
pub use builtin::{
    staple_categories, BuiltinRule, Category, CategorySet, BUILTIN_RULES, DEFAULT_PATTERN_WEIGHT,
    KNOWN_STAPLES,
};
pub use cache::{ClassificationCache, CACHE_FILE};
pub use classifier::{categorize, Categorizer};
pub use external::{parse_classifier_output, validate_labels, ClaudeClassifier, ExternalClassifier};
pub use store::{CategorizerConfig, CategoryRule, PatternDef, RuleStore};
