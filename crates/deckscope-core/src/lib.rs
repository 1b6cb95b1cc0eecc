pub mod analytics;
pub mod backfill;
pub mod card;
pub mod category;
pub mod color;
pub mod config;
pub mod deck;
pub mod error;
pub mod filter;
pub mod import;
pub mod ingest;
pub mod llm;
pub mod stats;
pub mod store;

pub use analytics::{NoData, Report};
pub use backfill::{backfill_categories, BackfillOptions, BackfillResult};
pub use card::{Board, Card, CardData, CategorySource, DeckEntry};
pub use color::{Color, ColorIdentity, ColorMode};
pub use config::{AnalysisConfig, Config};
pub use deck::{DeckRecord, NewDeck};
pub use error::{DeckscopeError, Result};
pub use filter::DeckFilter;
pub use import::{DeckImport, ImportCallback, ImportResult, ImportStatus, Importer};
pub use ingest::{
    download_bulk_data, find_deck_files, save_export, CardDatabase, CardLookup, ChainedLookup,
    SaveOptions, ScryfallApi,
};
pub use llm::{check_claude_cli, execute_claude, require_claude_cli, LlmConfig};
pub use stats::DeckStats;
pub use store::Store;

// Category system
pub use category::{
    categorize, Categorizer, Category, CategorySet, ClassificationCache, ExternalClassifier,
    RuleStore,
};
