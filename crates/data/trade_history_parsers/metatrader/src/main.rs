use anyhow::{bail, Context, Result};
use clap::Parser;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::info;

use metatrader::{MetaTraderHtmlParser, TradeRecord};

/// Extract closed trades from MetaTrader HTML statements.
///
/// If no files are given, every .htm/.html file in the current directory is parsed.
#[derive(Parser, Debug)]
#[command(name = "metatrader_parser", version, about)]
struct Cli {
    /// Statement files to parse
    files: Vec<PathBuf>,

    /// Parser settings JSON (defaults to ./parser_settings.json when present)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Write the JSON records here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print trade statistics to stderr
    #[arg(long)]
    summary: bool,

    /// Starting balance for the drawdown figures
    #[arg(long, default_value_t = 0.0)]
    initial_balance: f64,

    /// Log level filter, e.g. "debug" or "metatrader=trace"
    #[arg(long)]
    log_level: Option<String>,
}

fn is_statement(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("htm") || ext.eq_ignore_ascii_case("html"))
        .unwrap_or(false)
}

/// `.htm`/`.html` files directly inside `dir`, sorted by name.
fn discover_statements(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Cannot read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && is_statement(&path) {
            if let Some(filename) = path.file_name().and_then(|s| s.to_str()) {
                eprintln!("  ✓ Found: {}", filename);
            }
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parses each file on its own; a failing file is reported and skipped.
fn parse_all(parser: &MetaTraderHtmlParser, files: &[PathBuf]) -> Vec<TradeRecord> {
    let mut all_records = Vec::new();

    for file in files {
        eprintln!("\n📖 Parsing {}", file.display());

        match parser.parse_file(file) {
            Ok(records) => {
                eprintln!("  ✓ Found {} closed trades", records.len());
                all_records.extend(records);
            }
            Err(e) => {
                eprintln!("  ⚠ Warning: Could not parse file: {:#}", e);
                eprintln!("    Continuing with next file...");
            }
        }
    }

    all_records
}

fn print_summary(records: &[TradeRecord], initial_balance: f64) {
    let s = trade_summary::summarize(records, initial_balance);
    eprintln!("\n📊 Summary:");
    eprintln!("─────────────────────────────────────────");
    eprintln!(
        "✓ Trades: {} ({} long, {} short)",
        s.total_trades, s.long_positions, s.short_positions
    );
    eprintln!("✓ Winning / losing: {} / {}", s.profit_trades, s.loss_trades);
    eprintln!("✓ Gross profit: {:.2}", s.gross_profit);
    eprintln!("✓ Gross loss: {:.2}", s.gross_loss);
    eprintln!("✓ Net profit: {:.2}", s.net_profit);
    eprintln!("✓ Profit factor: {:.2}", s.profit_factor);
    eprintln!("✓ Expected payoff: {:.2}", s.expected_payoff);
    eprintln!(
        "✓ Maximal drawdown: {:.2} ({:.2}%)",
        s.maximal_drawdown, s.relative_drawdown
    );
    eprintln!("─────────────────────────────────────────");
}

fn run(cli: Cli) -> Result<()> {
    let settings = settings_loader::load_settings_with_fallback(cli.settings.as_ref())?;
    let parser = MetaTraderHtmlParser::new().with_settings(settings);
    info!(
        marker = %parser.settings().section_marker,
        terminators = ?parser.settings().section_terminators,
        "Parser settings loaded"
    );

    let mut files = cli.files;

    // If no files specified, auto-discover them
    if files.is_empty() {
        eprintln!("📂 No statement files specified, scanning current directory...");
        files = discover_statements(&env::current_dir()?)?;
    }

    if files.is_empty() {
        bail!("No .htm/.html files found");
    }

    let all_records = parse_all(&parser, &files);
    if all_records.is_empty() {
        bail!("No trade records found in any file");
    }

    let json = serde_json::to_string_pretty(&all_records)?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Cannot write {}", path.display()))?;
            eprintln!("\n✅ {} records written to: {}", all_records.len(), path.display());
        }
        None => println!("{}", json),
    }

    if cli.summary {
        print_summary(&all_records, cli.initial_balance);
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_with_level(cli.log_level.as_deref());
    run(cli)
}
