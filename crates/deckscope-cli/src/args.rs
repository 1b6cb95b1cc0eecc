use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "deckscope")]
#[command(about = "Statistical analysis of Commander decklists")]
#[command(version)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Base directory (default: ~/.deckscope)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// How `--colors` is compared against a deck's color identity
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Mode {
    /// Identity equals the query
    #[default]
    Exact,
    /// Deck has every queried color
    Contains,
    /// Deck uses only queried colors
    Subset,
}

/// Deck selection shared by the report commands
#[derive(Args, Clone, Debug, Default)]
pub struct FilterArgs {
    /// Color identity (e.g., G, UB, WUBRG; C for colorless)
    #[arg(short, long)]
    pub colors: Option<String>,

    /// Color matching mode
    #[arg(long, value_enum, default_value = "exact")]
    pub mode: Mode,

    /// Power bracket (1-4)
    #[arg(short, long)]
    pub bracket: Option<u32>,

    /// Commander (or partner) name
    #[arg(long)]
    pub commander: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the base directory and a default config, then fetch card data
    Init {
        /// Re-download card data even if it exists
        #[arg(short, long)]
        force: bool,

        /// Do not download card data
        #[arg(long, conflicts_with = "force")]
        skip_download: bool,
    },

    /// Import deck files (a .txt file or a directory of them)
    Import {
        /// Deck file or directory
        path: PathBuf,

        /// Re-import decks whose file was already imported
        #[arg(short, long)]
        force: bool,

        /// Run external categorization after import (overrides llm.enabled)
        #[arg(long)]
        categorize: bool,

        /// Never ask the card API for names missing from the card data
        #[arg(long)]
        offline: bool,
    },

    /// Save a deck-builder export (Moxfield text) as a deck file
    Save {
        /// Export file (reads stdin when omitted)
        #[arg(conflicts_with = "batch")]
        file: Option<PathBuf>,

        /// Convert every .txt export in a directory
        #[arg(long, value_name = "DIR")]
        batch: Option<PathBuf>,

        /// Power bracket (1-4)
        #[arg(short, long)]
        bracket: Option<u32>,

        /// Deck name
        #[arg(short, long)]
        name: Option<String>,

        /// Builder name
        #[arg(long)]
        builder: Option<String>,

        /// Commander (skips detection)
        #[arg(long, conflicts_with = "batch")]
        commander: Option<String>,

        /// Partner commander
        #[arg(long, requires = "commander")]
        partner: Option<String>,

        /// Output directory (default: <base>/decks)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// List imported decks, newest first
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Maximum decks to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Collection overview: decks per color and bracket
    Summary,

    /// Most played cards, grouped by category
    Staples {
        #[command(flatten)]
        filter: FilterArgs,

        /// Minimum number of decks a card must appear in
        #[arg(long)]
        min_appearances: Option<u32>,

        /// Maximum cards listed
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Average mana curve
    Curve {
        #[command(flatten)]
        filter: FilterArgs,

        /// Only decks whose commander has this mana value
        #[arg(long)]
        cmc: Option<f64>,
    },

    /// Category counts per deck (avg/min/max)
    Categories {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Cards that are played together
    Packages {
        #[command(flatten)]
        filter: FilterArgs,

        /// Minimum pairwise similarity (0-1)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Smallest package reported
        #[arg(long)]
        min_cards: Option<usize>,
    },

    /// Cards whose play rate differs between two brackets
    Compare {
        /// First bracket
        bracket_a: u32,

        /// Second bracket
        bracket_b: u32,

        #[command(flatten)]
        filter: FilterArgs,

        /// Minimum play-rate difference (0-1)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Cards listed per side
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Ramp profile for commanders of a given mana value
    Ramp {
        /// Commander mana value
        cmc: f64,

        #[command(flatten)]
        filter: FilterArgs,

        /// Ramp cards listed
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// How commander cost shapes the rest of the deck
    CmcCurve {
        #[command(flatten)]
        filter: FilterArgs,

        /// Spells listed per curve bucket
        #[arg(long)]
        top: Option<usize>,
    },

    /// Label `other`-only cards with the external classifier
    Categorize {
        /// Only list the candidate cards
        #[arg(short, long)]
        dry_run: bool,

        /// Maximum cards considered
        #[arg(short, long, default_value = "200")]
        limit: usize,
    },

    /// Manage card categories
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum TagAction {
    /// Replace a card's categories (recomputes every deck running it)
    Set {
        /// Card name
        card: String,

        /// Comma-separated categories (e.g., "ramp,draw")
        categories: String,
    },

    /// Show a card's categories
    Show {
        /// Card name (partial match allowed)
        card: String,
    },

    /// List cards carrying a category
    List {
        /// Category name
        category: String,

        /// Maximum cards to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., analysis.package_threshold)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., analysis.package_threshold)
        key: String,

        /// Value to set (e.g., "0.6" or "Sol Ring,Command Tower")
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Initialize config file with defaults
    Init,
}
