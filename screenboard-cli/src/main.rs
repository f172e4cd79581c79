//! Screenboard CLI — ranked market board in the terminal.
//!
//! Commands:
//! - `board` — fetch (or reuse), rank, enrich and print a screener board
//! - `rank` — rank a saved screener CSV and print or export it
//! - `sectors` — print the sector label table
//! - `link` — print quote URLs for tickers
//! - `config` — print the default configuration as TOML

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use screenboard_core::data::CsvFileProvider;
use screenboard_core::{
    Direction, QuoteLinker, RankedTable, RankingPipeline, ScreenerMode, ScreenerProvider,
    Snapshot,
};
use screenboard_runner::config::ProviderKind;
use screenboard_runner::export::{render, ExportFormat};
use screenboard_runner::{Board, BoardConfig, BoardView, Notice};

#[derive(Parser)]
#[command(
    name = "screenboard",
    about = "Screenboard CLI — ranked screener board with sector heatmap"
)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, rank and print a screener board.
    Board {
        /// Screener mode: momentum or sp500. Defaults to the config's mode.
        #[arg(long)]
        mode: Option<ScreenerMode>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rows to keep after ranking.
        #[arg(long)]
        limit: Option<usize>,

        /// Read the snapshot from a screener CSV instead of Finviz.
        #[arg(long, conflicts_with = "synthetic")]
        input: Option<PathBuf>,

        /// Use a seeded synthetic snapshot (no network).
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Skip company descriptions.
        #[arg(long, default_value_t = false)]
        no_enrich: bool,

        /// Print the board as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Rebuild the board every SECS seconds until interrupted.
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// Rank a screener CSV snapshot.
    Rank {
        /// Screener CSV export.
        #[arg(long)]
        input: PathBuf,

        /// Rows to keep after ranking.
        #[arg(long, default_value_t = screenboard_core::DEFAULT_LIMIT)]
        limit: usize,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the sector label table.
    Sectors {
        /// Path to a TOML config file with `[sectors]` overrides.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print quote URLs for tickers.
    Link {
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Quote site base URL.
        #[arg(long, default_value = screenboard_core::links::DEFAULT_QUOTE_BASE)]
        base: String,
    },
    /// Print the default configuration as TOML.
    Config,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Board {
            mode,
            config,
            limit,
            input,
            synthetic,
            no_enrich,
            json,
            watch,
        } => {
            let opts = BoardOpts {
                mode,
                config,
                limit,
                input,
                synthetic,
                no_enrich,
                json,
                watch,
            };
            run_board(opts)
        }
        Commands::Rank {
            input,
            limit,
            format,
            output,
        } => run_rank(&input, limit, format, output.as_deref()),
        Commands::Sectors { config } => run_sectors(config.as_deref()),
        Commands::Link { tickers, base } => run_link(&tickers, &base),
        Commands::Config => {
            print!("{}", BoardConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "screenboard=info,warn",
        1 => "screenboard=debug,info",
        _ => "screenboard=trace,debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

struct BoardOpts {
    mode: Option<ScreenerMode>,
    config: Option<PathBuf>,
    limit: Option<usize>,
    input: Option<PathBuf>,
    synthetic: bool,
    no_enrich: bool,
    json: bool,
    watch: Option<u64>,
}

fn load_config(path: Option<&Path>) -> Result<BoardConfig> {
    let mut config = match path {
        Some(p) => BoardConfig::from_file(p)?,
        None => BoardConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

fn run_board(opts: BoardOpts) -> Result<()> {
    let mut config = load_config(opts.config.as_deref())?;
    if let Some(limit) = opts.limit {
        config.board.limit = limit;
    }
    if let Some(path) = opts.input {
        config.screener.provider = ProviderKind::Csv;
        config.screener.csv_path = Some(path);
    } else if opts.synthetic {
        config.screener.provider = ProviderKind::Synthetic;
    }
    if opts.no_enrich {
        config.enrichment.enabled = false;
    }
    config.validate()?;

    let mode = opts.mode.unwrap_or(config.board.mode);
    let board = Board::from_config(&config)?;

    let Some(secs) = opts.watch else {
        let view = board.build(mode);
        return print_view(&view, opts.json);
    };
    if secs == 0 {
        bail!("--watch interval must be at least 1 second");
    }

    loop {
        let view = board.build(mode);
        print_view(&view, opts.json)?;
        std::thread::sleep(Duration::from_secs(secs));
        println!();
    }
}

fn print_view(view: &BoardView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    for notice in &view.notices {
        eprintln!("! {notice}");
    }

    let Some(table) = &view.table else {
        return Ok(());
    };

    let freshness = if view.from_cache {
        format!("cached {}s ago", view.age.as_secs())
    } else {
        "fresh".to_string()
    };
    println!(
        "{} | {} rows ({}, {})",
        view.mode.display_name(),
        table.len(),
        table.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
        freshness
    );
    println!();
    println!(
        "{:>4} {:<8} {:<12} {:>10} {:>10}  Description",
        "#", "Ticker", "Sector", "Price", "Change"
    );
    println!("{}", "-".repeat(64));
    for card in &view.cards {
        println!(
            "{:>4} {:<8} {:<12} {:>10} {:>10}  {}",
            card.rank,
            card.ticker,
            card.sector_label,
            card.price.as_deref().unwrap_or("-"),
            change_cell(card.direction, card.change_pct),
            card.description.as_ref().map(|d| d.text()).unwrap_or(""),
        );
    }

    if !view.heatmap.is_empty() {
        println!();
        println!("Sectors:");
        for group in &view.heatmap {
            let tickers: Vec<&str> = group.tiles.iter().map(|t| t.ticker.as_str()).collect();
            println!(
                "  {:<12} {:>+7.2}%  {}",
                group.label,
                group.mean_change(),
                tickers.join(" ")
            );
        }
    }
    Ok(())
}

fn run_rank(
    input: &Path,
    limit: usize,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    if limit == 0 {
        bail!("--limit must be at least 1");
    }
    let snapshot = CsvFileProvider::new(input)
        .fetch(ScreenerMode::default())
        .with_context(|| format!("failed to read {}", input.display()))?;
    if snapshot.is_empty() {
        eprintln!("! {} has no rows", input.display());
    }

    let pipeline = RankingPipeline::new(Default::default(), limit);
    let table = rank_or_empty(&pipeline, &snapshot);

    let content = match format {
        OutputFormat::Table => table_text(&table),
        OutputFormat::Json => render(&table, ExportFormat::Json)?,
        OutputFormat::Csv => render(&table, ExportFormat::Csv)?,
    };

    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {} rows to {}", table.len(), path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

/// Arrow then magnitude; the arrow carries the sign.
fn change_cell(direction: Direction, change_pct: f64) -> String {
    format!("{} {:.2}%", direction.arrow(), change_pct.abs())
}

/// A snapshot without a change or ticker column ranks to an empty table
/// with a diagnostic on stderr.
fn rank_or_empty(pipeline: &RankingPipeline, snapshot: &Snapshot) -> RankedTable {
    let mode = ScreenerMode::default();
    pipeline.run(snapshot, mode).unwrap_or_else(|err| {
        eprintln!("! {}", Notice::from(&err));
        RankedTable::empty(mode, snapshot)
    })
}

fn table_text(table: &RankedTable) -> String {
    let mut out = format!(
        "{:>4} {:<8} {:<12} {:>10} {:>10}\n{}\n",
        "#",
        "Ticker",
        "Sector",
        "Price",
        "Change",
        "-".repeat(48)
    );
    for row in &table.rows {
        out.push_str(&format!(
            "{:>4} {:<8} {:<12} {:>10} {:>10}\n",
            row.rank,
            row.ticker,
            row.sector_label,
            row.price.as_deref().unwrap_or("-"),
            row.change_raw,
        ));
    }
    out
}

fn run_sectors(config: Option<&Path>) -> Result<()> {
    let table = load_config(config)?.sector_table();
    println!("{:<24} Label", "Sector");
    println!("{}", "-".repeat(36));
    for (sector, label) in table.entries() {
        println!("{sector:<24} {label}");
    }
    Ok(())
}

fn run_link(tickers: &[String], base: &str) -> Result<()> {
    let linker = QuoteLinker::new(base)?;
    for ticker in tickers {
        let url = linker
            .quote_url(ticker)
            .with_context(|| format!("no quote link for {ticker:?}"))?;
        println!("{ticker}\t{url}");
    }
    Ok(())
}
