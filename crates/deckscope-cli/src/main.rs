use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use serde::Serialize;

use deckscope_core::analytics::{
    self, find_packages, BracketDiff, PackageParams, Report, StapleCard,
};
use deckscope_core::backfill::{backfill_categories, BackfillOptions};
use deckscope_core::category::{
    Categorizer, Category, CategorySet, ClassificationCache, ClaudeClassifier,
    ExternalClassifier, RuleStore,
};
use deckscope_core::config::Config;
use deckscope_core::ingest::{
    download_bulk_data, find_deck_files, save_export, CardDatabase, CardLookup, ChainedLookup,
    SaveOptions, SavedDeck, ScryfallApi, SCRYFALL_API,
};
use deckscope_core::stats::curve_label;
use deckscope_core::{
    CategorySource, ColorMode, DeckFilter, DeckscopeError, Importer, Result, Store,
};

/// Where `save` writes deck files unless told otherwise
const DECKS_DIR: &str = "decks";

mod args;
use args::{Cli, Commands, ConfigAction, FilterArgs, Mode, Shell, TagAction};

/// Output switches shared by every handler
#[derive(Clone, Copy)]
struct Output {
    verbose: bool,
    quiet: bool,
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let base_dir = resolve_base_dir(cli.base_dir);
    let out = Output {
        verbose: cli.verbose,
        quiet: cli.quiet,
        json: cli.json,
    };

    let result = match cli.command {
        Some(Commands::Init {
            force,
            skip_download,
        }) => handle_init(&base_dir, out, force, skip_download),
        Some(Commands::Import {
            path,
            force,
            categorize,
            offline,
        }) => handle_import(&base_dir, out, &path, force, categorize, offline),
        Some(Commands::Save {
            file,
            batch,
            bracket,
            name,
            builder,
            commander,
            partner,
            output_dir,
        }) => {
            let options = SaveOptions {
                commander,
                partner,
                bracket,
                deck_name: name,
                builder,
            };
            let output_dir = output_dir.unwrap_or_else(|| base_dir.join(DECKS_DIR));
            handle_save(out, file.as_deref(), batch.as_deref(), &options, &output_dir)
        }
        Some(Commands::List { filter, limit }) => handle_list(&base_dir, out, &filter, limit),
        Some(Commands::Summary) => handle_summary(&base_dir, out),
        Some(Commands::Staples {
            filter,
            min_appearances,
            limit,
        }) => handle_staples(&base_dir, out, &filter, min_appearances, limit),
        Some(Commands::Curve { filter, cmc }) => handle_curve(&base_dir, out, &filter, cmc),
        Some(Commands::Categories { filter }) => handle_categories(&base_dir, out, &filter),
        Some(Commands::Packages {
            filter,
            threshold,
            min_cards,
        }) => handle_packages(&base_dir, out, &filter, threshold, min_cards),
        Some(Commands::Compare {
            bracket_a,
            bracket_b,
            filter,
            threshold,
            limit,
        }) => handle_compare(&base_dir, out, &filter, bracket_a, bracket_b, threshold, limit),
        Some(Commands::Ramp { cmc, filter, limit }) => {
            handle_ramp(&base_dir, out, &filter, cmc, limit)
        }
        Some(Commands::CmcCurve { filter, top }) => handle_cmc_curve(&base_dir, out, &filter, top),
        Some(Commands::Categorize { dry_run, limit }) => {
            handle_categorize(&base_dir, out, dry_run, limit)
        }
        Some(Commands::Tag { action }) => handle_tag(action, &base_dir, out),
        Some(Commands::Config { action }) => handle_config(action, &base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "deckscope", &mut io::stdout());
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("DECKSCOPE_BASE") {
        return PathBuf::from(base);
    }

    dirs::home_dir()
        .map(|h| h.join(".deckscope"))
        .unwrap_or_else(|| PathBuf::from(".deckscope"))
}

// =============================================================================
// Shared helpers
// =============================================================================

impl From<Mode> for ColorMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Exact => ColorMode::Exact,
            Mode::Contains => ColorMode::Contains,
            Mode::Subset => ColorMode::Subset,
        }
    }
}

fn build_filter(args: &FilterArgs) -> Result<DeckFilter> {
    let mut filter = DeckFilter::new();
    if let Some(colors) = &args.colors {
        filter = filter.colors(colors.parse()?, args.mode.into());
    }
    if let Some(bracket) = args.bracket {
        filter = filter.bracket(bracket);
    }
    if let Some(commander) = &args.commander {
        filter = filter.commander(commander.clone());
    }
    Ok(filter)
}

fn print_status(out: Output, status: &str, message: &str) {
    if out.quiet && status != "ERROR" {
        return;
    }
    let status_str = match status {
        "OK" => format!("[{}]", status).green(),
        "SKIP" => format!("[{}]", status).yellow(),
        "WARN" => format!("[{}]", status).yellow().bold(),
        "ERROR" => format!("[{}]", status).red().bold(),
        _ => format!("[{}]", status).normal(),
    };
    println!("  {} {}", status_str, message);
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a report as JSON, or hand a ready payload to `render`
fn emit<T: Serialize>(out: Output, report: &Report<T>, render: impl FnOnce(&T)) -> Result<()> {
    if out.json {
        return print_json(report);
    }
    match report {
        Report::Ready(payload) => render(payload),
        Report::NoData(no_data) => {
            println!(
                "{} {} ({} decks matched)",
                "[WARN]".yellow().bold(),
                no_data.error,
                no_data.deck_count
            );
        }
    }
    Ok(())
}

fn bracket_label(bracket: Option<u32>) -> String {
    bracket
        .map(|b| format!("bracket {}", b))
        .unwrap_or_else(|| "all brackets".to_string())
}

fn bar(value: f64) -> String {
    "#".repeat(value.max(0.0).round() as usize)
}

// =============================================================================
// Setup and ingestion
// =============================================================================

fn handle_init(base_dir: &Path, out: Output, force: bool, skip_download: bool) -> Result<()> {
    let config_path = Config::init(base_dir)?;
    Store::open(base_dir)?;

    if !out.quiet {
        println!("{} {}", "Initialized:".green(), base_dir.display());
        println!("  Config:   {}", config_path.display());
        println!("  Database: {}", Store::path(base_dir).display());
    }

    let card_data = CardDatabase::path(base_dir);
    if skip_download {
        if !card_data.exists() {
            print_status(out, "WARN", &format!("Card data not found: {}", card_data.display()));
        }
        return Ok(());
    }
    if card_data.exists() && !force {
        if out.verbose {
            println!("Card data present: {} (use --force to re-download)", card_data.display());
        }
        return Ok(());
    }

    if !out.quiet {
        println!();
        println!("Downloading card data from {}...", SCRYFALL_API);
    }
    match download_bulk_data(&card_data) {
        Ok(bytes) => print_status(
            out,
            "OK",
            &format!("{} ({} MB)", card_data.display(), bytes / (1024 * 1024)),
        ),
        Err(e) => {
            print_status(out, "WARN", &format!("Could not download card data: {}", e));
            if !out.quiet {
                println!("  Download the Scryfall \"Oracle Cards\" bulk file manually and save it as:");
                println!("  {}", card_data.display());
            }
        }
    }
    Ok(())
}

fn handle_import(
    base_dir: &Path,
    out: Output,
    path: &Path,
    force: bool,
    categorize: bool,
    offline: bool,
) -> Result<()> {
    let config = Config::load(base_dir)?;
    let db = match CardDatabase::load(&CardDatabase::path(base_dir)) {
        Err(DeckscopeError::CardDataMissing { path }) if !offline => {
            print_status(
                out,
                "WARN",
                &format!("Card data not found: {} (using the card API only)", path.display()),
            );
            CardDatabase::default()
        }
        other => other?,
    };
    let api = ScryfallApi::new();
    let online = ChainedLookup::new(&db, &api);
    let lookup: &dyn CardLookup = if offline { &db } else { &online };
    let rules = RuleStore::builtin().with_config(&config.categorizer)?;
    let categorizer = Categorizer::new(&rules)?;

    let files = find_deck_files(path);
    if files.is_empty() {
        println!("No deck files found in {}", path.display());
        return Ok(());
    }

    if out.verbose {
        println!("Card data: {} cards", db.len());
        println!("Categorizer: {} patterns loaded", rules.pattern_count());
    }
    if !out.quiet {
        println!();
        println!("Importing {} file(s)...", files.len());
    }

    let mut store = Store::open(base_dir)?;
    let on_file = |status: &str, message: &str| print_status(out, status, message);
    let result =
        Importer::new(&mut store, lookup, &categorizer).import_files(&files, force, Some(&on_file))?;
    if let Some(reason) = api.failure() {
        print_status(out, "WARN", &format!("Card API unavailable, later lookups skipped: {}", reason));
    }

    if !out.quiet {
        println!();
        println!("Summary:");
        println!("  Imported: {}", result.imported);
        println!("  Skipped: {}", result.skipped);
        println!("  Errors: {}", result.errors);
    }

    if categorize || config.llm.enabled {
        let options = BackfillOptions {
            batch_size: config.llm.batch_size,
            ..Default::default()
        };
        run_backfill(base_dir, &mut store, &options, out)?;
    }
    Ok(())
}

fn handle_save(
    out: Output,
    file: Option<&Path>,
    batch: Option<&Path>,
    options: &SaveOptions,
    output_dir: &Path,
) -> Result<()> {
    if let Some(dir) = batch {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        files.sort();
        if files.is_empty() {
            println!("No .txt files found in {}", dir.display());
            return Ok(());
        }

        let mut saved = 0;
        for path in &files {
            let input = path.display().to_string();
            let text = fs::read_to_string(path)?;
            match save_export(&text, &input, options, output_dir) {
                Ok(deck) => {
                    print_saved(out, &input, &deck);
                    saved += 1;
                }
                Err(e) => print_status(out, "ERROR", &format!("{}: {}", input, e)),
            }
        }
        if !out.quiet {
            println!();
            println!("Saved {} of {} export(s) to {}", saved, files.len(), output_dir.display());
        }
        return Ok(());
    }

    let (text, input) = match file {
        Some(path) => (fs::read_to_string(path)?, path.display().to_string()),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            (text, "stdin".to_string())
        }
    };
    if text.trim().is_empty() {
        println!("No input received from {}", input);
        return Ok(());
    }

    let deck = save_export(&text, &input, options, output_dir)?;
    print_saved(out, &input, &deck);
    Ok(())
}

fn print_saved(out: Output, input: &str, deck: &SavedDeck) {
    if out.verbose {
        println!("  Commander: {}", deck.meta.commander);
        if let Some(partner) = &deck.meta.partner {
            println!("  Partner:   {}", partner);
        }
    }
    let file = deck
        .path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default();
    print_status(out, "OK", &format!("{} -> {}", input, file));
}

fn handle_categorize(base_dir: &Path, out: Output, dry_run: bool, limit: usize) -> Result<()> {
    let config = Config::load(base_dir)?;
    let mut store = Store::open(base_dir)?;
    let options = BackfillOptions {
        limit,
        batch_size: config.llm.batch_size,
        dry_run,
    };
    run_backfill(base_dir, &mut store, &options, out)
}

fn run_backfill(
    base_dir: &Path,
    store: &mut Store,
    options: &BackfillOptions,
    out: Output,
) -> Result<()> {
    let mut cache = ClassificationCache::load(base_dir)?;
    let classifier = if options.dry_run {
        None
    } else {
        match ClaudeClassifier::new(base_dir.to_path_buf()) {
            Ok(classifier) => Some(classifier),
            Err(e) => {
                if out.verbose {
                    print_status(out, "WARN", &e.to_string());
                }
                None
            }
        }
    };

    let result = backfill_categories(
        store,
        classifier.as_ref().map(|c| c as &dyn ExternalClassifier),
        &mut cache,
        options,
    )?;

    if options.dry_run {
        if out.json {
            return print_json(&result.candidates);
        }
        println!();
        println!("Cards labelled only 'other': {}", result.candidates.len());
        for name in &result.candidates {
            println!("  {}", name);
        }
        return Ok(());
    }

    for warning in &result.warnings {
        print_status(out, "WARN", warning);
    }
    if !out.quiet {
        println!();
        println!("Categorize:");
        println!("  Candidates: {}", result.candidates.len());
        println!("  From cache: {}", result.from_cache);
        println!("  Classified: {}", result.classified);
        println!("  Updated: {}", result.updated);
        println!("  Decks recomputed: {}", result.decks_recomputed);
    }
    Ok(())
}

// =============================================================================
// Reports
// =============================================================================

fn handle_list(base_dir: &Path, out: Output, args: &FilterArgs, limit: usize) -> Result<()> {
    let store = Store::open(base_dir)?;
    let decks = analytics::list_decks(&store, &build_filter(args)?, limit)?;
    if out.json {
        return print_json(&decks);
    }
    if decks.is_empty() {
        println!("No decks found.");
        println!();
        println!("Import some with: deckscope import <path>");
        return Ok(());
    }

    println!();
    for deck in &decks {
        let bracket = deck
            .bracket
            .map(|b| format!("B{}", b))
            .unwrap_or_else(|| "B?".to_string());
        println!(
            "  {:>4}  {}  [{}]  {}  {}",
            format!("#{}", deck.id).dimmed(),
            deck.commander_label().cyan().bold(),
            deck.color_identity,
            bracket,
            deck.name
        );
        if out.verbose {
            if let Some(stats) = &deck.stats {
                println!(
                    "        {} cards, {} lands, avg mana value {:.2}",
                    stats.total_cards, stats.land_count, stats.avg_mana_value
                );
            }
            println!("        added {}", deck.date_added);
        }
    }
    println!();
    Ok(())
}

fn handle_summary(base_dir: &Path, out: Output) -> Result<()> {
    let store = Store::open(base_dir)?;
    let summary = analytics::summary(&store)?;
    if out.json {
        return print_json(&summary);
    }

    println!();
    println!("Decks: {}", summary.total_decks.to_string().cyan().bold());
    println!("Unique cards: {}", summary.unique_cards);
    println!();
    println!("By color identity:");
    for color in &summary.by_color {
        let key = if color.key.is_empty() { "C" } else { &color.key };
        println!("  {:>5}  {:<12} {}", key, color.colors, color.count);
    }
    println!();
    println!("By bracket:");
    for bracket in &summary.by_bracket {
        println!("  {:>5}  {}", bracket.bracket, bracket.count);
    }
    println!();
    Ok(())
}

fn handle_staples(
    base_dir: &Path,
    out: Output,
    args: &FilterArgs,
    min_appearances: Option<u32>,
    limit: Option<usize>,
) -> Result<()> {
    let config = Config::load(base_dir)?;
    let store = Store::open(base_dir)?;
    let filter = build_filter(args)?;
    let report = analytics::top_cards(
        &store,
        &filter,
        min_appearances.unwrap_or(config.analysis.min_appearances),
        limit.unwrap_or(config.analysis.top_cards_limit),
    )?;

    emit(out, &report, |staples| {
        println!();
        println!(
            "Staples: {} ({}), {}, {} decks",
            staples.color_name.cyan().bold(),
            staples.color_identity,
            bracket_label(staples.bracket),
            staples.deck_count
        );
        for (category, cards) in &staples.cards_by_category {
            println!();
            println!("{}", category.to_string().to_uppercase().yellow());
            for card in cards {
                print_staple(card, out.verbose);
            }
        }
        println!();
    })
}

fn print_staple(card: &StapleCard, verbose: bool) {
    let mana_value = card
        .mana_value
        .map(|mv| mv.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {:>5.1}%  {:>3}  {}  ({})",
        card.percentage, card.appearances, card.name, mana_value
    );
    if verbose && !card.type_line.is_empty() {
        println!("               {}", card.type_line.dimmed());
    }
}

fn handle_curve(base_dir: &Path, out: Output, args: &FilterArgs, cmc: Option<f64>) -> Result<()> {
    let store = Store::open(base_dir)?;
    let mut filter = build_filter(args)?;
    if let Some(cmc) = cmc {
        filter = filter.commander_mana_value(cmc);
    }
    let report = analytics::curve_profile(&store, &filter)?;

    emit(out, &report, |profile| {
        println!();
        println!(
            "Mana curve: {}, {}, {} decks",
            profile.color_identity.cyan().bold(),
            bracket_label(profile.bracket),
            profile.deck_count
        );
        if let Some(mv) = profile.commander_mana_value {
            println!("Commander mana value: {}", mv);
        }
        println!();
        for bucket in &profile.curve {
            println!(
                "  {:>3}  {:>5.1}  ({:>2}-{:<2})  {}",
                bucket.label,
                bucket.avg,
                bucket.min,
                bucket.max,
                bar(bucket.avg).green()
            );
        }
        println!();
    })
}

fn handle_categories(base_dir: &Path, out: Output, args: &FilterArgs) -> Result<()> {
    let store = Store::open(base_dir)?;
    let report = analytics::category_distribution(&store, &build_filter(args)?)?;

    emit(out, &report, |distribution| {
        println!();
        println!(
            "Categories: {}, {}, {} decks",
            distribution.color_identity.cyan().bold(),
            bracket_label(distribution.bracket),
            distribution.deck_count
        );
        println!();
        for (category, spread) in &distribution.categories {
            println!(
                "  {:<13} avg {:>5.1}  ({:>2}-{:<2})  in {} decks",
                category.to_string(),
                spread.avg,
                spread.min,
                spread.max,
                spread.decks_with
            );
        }
        println!();
    })
}

fn handle_packages(
    base_dir: &Path,
    out: Output,
    args: &FilterArgs,
    threshold: Option<f64>,
    min_cards: Option<usize>,
) -> Result<()> {
    let config = Config::load(base_dir)?;
    let store = Store::open(base_dir)?;
    let mut params = PackageParams::from(&config.analysis);
    if let Some(threshold) = threshold {
        params.threshold = threshold;
    }
    if let Some(min_cards) = min_cards {
        params.min_cards = min_cards;
    }
    let report = find_packages(&store, &build_filter(args)?, &params)?;

    emit(out, &report, |report| {
        println!();
        println!(
            "Packages: {}, {}, {} decks (similarity >= {})",
            report.color_identity.cyan().bold(),
            bracket_label(report.bracket),
            report.deck_count,
            params.threshold
        );
        if report.packages.is_empty() {
            println!();
            println!("No packages found.");
        }
        for (i, package) in report.packages.iter().enumerate() {
            println!();
            println!(
                "  {} {:.1}% ({} decks)",
                format!("Package {}:", i + 1).yellow(),
                package.frequency,
                package.deck_count
            );
            for card in &package.cards {
                println!("    {}", card);
            }
        }
        println!();
    })
}

fn handle_compare(
    base_dir: &Path,
    out: Output,
    args: &FilterArgs,
    bracket_a: u32,
    bracket_b: u32,
    threshold: Option<f64>,
    limit: Option<usize>,
) -> Result<()> {
    let config = Config::load(base_dir)?;
    let store = Store::open(base_dir)?;
    let report = analytics::compare_brackets(
        &store,
        &build_filter(args)?,
        bracket_a,
        bracket_b,
        threshold.unwrap_or(config.analysis.bracket_diff_threshold),
        limit.unwrap_or(config.analysis.bracket_diff_limit),
    )?;

    emit(out, &report, |cmp| {
        println!();
        println!(
            "Bracket {} ({} decks) vs bracket {} ({} decks): {}",
            cmp.bracket_a, cmp.decks_a, cmp.bracket_b, cmp.decks_b,
            cmp.color_name.cyan().bold()
        );
        print_diffs(&format!("More in bracket {}", cmp.bracket_a), &cmp.more_in_bracket_a);
        print_diffs(&format!("More in bracket {}", cmp.bracket_b), &cmp.more_in_bracket_b);
        println!();
    })
}

fn print_diffs(title: &str, diffs: &[BracketDiff]) {
    println!();
    println!("{}", title.yellow());
    if diffs.is_empty() {
        println!("  (none)");
    }
    for diff in diffs {
        println!(
            "  {:>5.1}  {:>5.1}% vs {:>5.1}%  {}",
            diff.diff, diff.pct_a, diff.pct_b, diff.name
        );
    }
}

fn handle_ramp(
    base_dir: &Path,
    out: Output,
    args: &FilterArgs,
    cmc: f64,
    limit: Option<usize>,
) -> Result<()> {
    let config = Config::load(base_dir)?;
    let store = Store::open(base_dir)?;
    let report = analytics::ramp_by_commander_mana_value(
        &store,
        &build_filter(args)?,
        cmc,
        limit.unwrap_or(config.analysis.ramp_top_cards),
    )?;

    emit(out, &report, |ramp| {
        println!();
        println!(
            "Ramp for mana value {} commanders: {}, {} decks",
            ramp.commander_mana_value,
            ramp.color_identity.cyan().bold(),
            ramp.deck_count
        );
        println!(
            "  Ramp per deck: avg {:.1} ({}-{})",
            ramp.avg_ramp_count, ramp.ramp_range.min, ramp.ramp_range.max
        );
        println!("  Lands per deck: avg {:.1}", ramp.avg_land_count);
        println!();
        for card in &ramp.top_ramp_cards {
            println!("  {:>5.1}%  {:>3}  {}", card.percentage, card.appearances, card.name);
        }
        println!();
    })
}

fn handle_cmc_curve(base_dir: &Path, out: Output, args: &FilterArgs, top: Option<usize>) -> Result<()> {
    let config = Config::load(base_dir)?;
    let store = Store::open(base_dir)?;
    let report = analytics::cost_curve_correlation(
        &store,
        &build_filter(args)?,
        top.unwrap_or(config.analysis.top_spells_per_bucket),
    )?;

    emit(out, &report, |report| {
        println!();
        println!(
            "Commander cost vs curve: {}, {}, {} decks",
            report.color_identity.cyan().bold(),
            bracket_label(report.bracket),
            report.deck_count
        );
        for group in &report.groups {
            println!();
            println!(
                "{} ({} decks, avg deck mana value {:.2})",
                format!("Commander mana value {}", group.commander_mana_value).yellow(),
                group.deck_count,
                group.avg_deck_mana_value
            );
            if out.verbose {
                println!("  Commanders: {}", group.commanders.join(", "));
            }
            println!(
                "  Ramp {:.1}  Draw {:.1}  Lands {:.1}",
                group.avg_ramp, group.avg_draw, group.avg_lands
            );
            let curve: Vec<String> = group
                .avg_curve
                .iter()
                .enumerate()
                .map(|(i, avg)| format!("{}:{:.1}", curve_label(i), avg))
                .collect();
            println!("  Curve {}", curve.join("  "));
            for (bucket, spells) in &group.top_spells {
                let names: Vec<String> = spells
                    .iter()
                    .map(|s| format!("{} ({})", s.name, s.count))
                    .collect();
                println!("  {:>3}: {}", curve_label(*bucket), names.join(", "));
            }
        }
        println!();
    })
}

// =============================================================================
// Tags and configuration
// =============================================================================

fn handle_tag(action: TagAction, base_dir: &Path, out: Output) -> Result<()> {
    let mut store = Store::open(base_dir)?;

    match action {
        TagAction::Set { card, categories } => {
            let labels = CategorySet::parse_list(&categories)?;
            let found = store
                .find_card(&card)?
                .ok_or(DeckscopeError::CardNotFound { name: card })?;
            let affected =
                store.set_card_categories(&found.data.name, &labels, CategorySource::Manual)?;
            if !out.quiet {
                println!(
                    "{} {} = {} ({} decks recomputed)",
                    "Tagged:".green(),
                    found.data.name,
                    labels,
                    affected.len()
                );
            }
        }
        TagAction::Show { card } => {
            let found = store
                .find_card(&card)?
                .ok_or(DeckscopeError::CardNotFound { name: card })?;
            if out.json {
                return print_json(&found);
            }
            println!();
            println!("{}", found.data.name.cyan().bold());
            println!("  Categories: {}", found.categories);
            println!("  Source: {}", found.category_source.as_str());
            println!("  Type: {}", found.data.type_line);
            println!("  Mana value: {}", found.data.mana_value);
            if out.verbose && !found.data.oracle_text.is_empty() {
                println!();
                for line in found.data.oracle_text.lines() {
                    println!("  {}", line.dimmed());
                }
            }
            println!();
        }
        TagAction::List { category, limit } => {
            let category: Category = category.parse()?;
            let cards: Vec<_> = store
                .all_cards()?
                .into_iter()
                .filter(|c| c.categories.contains(category))
                .take(limit)
                .collect();
            if out.json {
                return print_json(&cards);
            }
            if cards.is_empty() {
                println!("No cards labelled '{}'.", category);
                return Ok(());
            }
            println!();
            for card in &cards {
                println!(
                    "  {}  [{}]  {}",
                    card.data.name,
                    card.categories,
                    card.category_source.as_str().dimmed()
                );
            }
            println!();
        }
    }

    Ok(())
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(DeckscopeError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}
