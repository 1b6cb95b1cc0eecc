use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeckscopeError {
    #[error("Card not found: {name}")]
    CardNotFound { name: String },

    #[error("Deck not found: #{id}")]
    DeckNotFound { id: i64 },

    #[error("Invalid color identity: '{input}' - use only W, U, B, R, G")]
    InvalidColors { input: String },

    #[error("Unknown category: '{name}' - valid: {valid}")]
    UnknownCategory { name: String, valid: String },

    #[error("Invalid deck file name: '{name}' - expected 'Commander Name--Bracket--Deck Name.txt'")]
    InvalidDeckFileName { name: String },

    #[error("Invalid pattern for category '{category}': {message}")]
    InvalidPattern { category: String, message: String },

    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Unknown config key: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("Invalid value for {key}: {message}")]
    ConfigValue { key: String, message: String },

    #[error("Card data not found at {path} - download Scryfall oracle bulk data there first")]
    CardDataMissing { path: PathBuf },

    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Could not detect a commander in {input} - pass --commander")]
    CommanderNotDetected { input: String },

    #[error("Claude CLI not found - install it to enable external categorization")]
    ClaudeNotFound,

    #[error("Claude execution failed: {message}")]
    ClaudeExecutionFailed { message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Home directory not found")]
    HomeNotFound,
}

pub type Result<T> = std::result::Result<T, DeckscopeError>;

impl DeckscopeError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CardNotFound { .. } | Self::DeckNotFound { .. } => 2,
            Self::InvalidColors { .. } | Self::UnknownCategory { .. } => 3,
            Self::InvalidDeckFileName { .. } | Self::CommanderNotDetected { .. } => 4,
            Self::ConfigParse { .. } | Self::ConfigKeyNotFound { .. } | Self::ConfigValue { .. } => {
                5
            }
            Self::CardDataMissing { .. } => 6,
            Self::Database(_) => 7,
            _ => 1,
        }
    }
}
