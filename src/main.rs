//! skinsweep - Batch skin-price aggregator for case-site catalogs
//!
//! Resolves item prices from case-site catalogs into a shared workbook.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use skinsweep::batch::{BatchController, BatchOptions, CancelFlag, Progress, RetryPolicy};
use skinsweep::config::Config;
use skinsweep::identity::normalize;
use skinsweep::market::{make_adapter, Outcome, SourceId};
use skinsweep::page::HttpPage;
use skinsweep::store::CsvWorkbook;
use skinsweep::SheetSelection;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "skinsweep",
    version,
    about = "Batch skin-price aggregator for case-site catalogs",
    long_about = "Resolves market prices for skin, knife and sticker identities \
                  from several case-site catalogs and writes them back into a \
                  shared workbook, one price column per source."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "SKINSWEEP_PROXY")]
    proxy: Option<String>,

    /// Delay between requests in milliseconds
    #[arg(long, global = true, env = "SKINSWEEP_DELAY")]
    delay: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve prices for the workbook's sheets
    #[command(alias = "r")]
    Run {
        /// Source catalog to query
        #[arg(short, long)]
        source: SourceId,

        /// Sheets to process: "all" or 1-based numbers ("1,3")
        #[arg(long, default_value = "all")]
        sheets: SheetSelection,

        /// Workbook path (overrides config)
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Resolve a single item name and print the outcome
    Resolve {
        /// Source catalog to query
        #[arg(short, long)]
        source: SourceId,

        /// Raw item name
        name: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported sources
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }

    match cli.command {
        Commands::Run { source, sheets, store } => {
            if let Some(store) = store {
                config.store = store;
            }
            run_batch(&config, source, sheets).await?;
        }

        Commands::Resolve { source, name, json } => {
            let identity = normalize(&name);
            let adapter = make_adapter(source);
            let page = HttpPage::new(&config).context("Failed to create page session")?;

            let result = adapter.resolve_price(&page, &identity).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                match result.outcome {
                    Outcome::Matched(price) => println!("{} -> {}", identity, price),
                    Outcome::NotFound => println!("{} -> no listing found", identity),
                    Outcome::Ambiguous => println!("{} -> ambiguous listings", identity),
                    Outcome::Error(e) => println!("{} -> {}", identity, e),
                }
            }
        }

        Commands::Sources => {
            println!("Supported sources:\n");
            println!("{:<12} {:<14} {:<28} {}", "Source", "Lookup", "Base URL", "Column");
            println!("{:-<12} {:-<14} {:-<28} {:-<16}", "", "", "", "");

            for source in SourceId::all() {
                let adapter = make_adapter(*source);
                println!(
                    "{:<12} {:<14} {:<28} {}",
                    source.to_string(),
                    source.lookup_style(),
                    adapter.base_url(),
                    source.price_column()
                );
            }
        }
    }

    Ok(())
}

async fn run_batch(config: &Config, source: SourceId, sheets: SheetSelection) -> Result<()> {
    let mut workbook = CsvWorkbook::open(&config.store)
        .with_context(|| format!("Cannot open workbook at {}", config.store.display()))?;

    let adapter = make_adapter(source);
    let page = HttpPage::new(config).context("Failed to create page session")?;

    // Ctrl-C flips the flag; the controller aborts between rows and leaves
    // the workbook untouched.
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupt received, finishing current row...");
                cancel.cancel();
            }
        });
    }

    let options = BatchOptions {
        selection: sheets,
        item_column: config.item_column.clone(),
        resolve_retry: RetryPolicy::new(
            config.resolve_attempts,
            Duration::from_millis(config.resolve_retry_delay_ms),
        ),
        replace_retry: RetryPolicy::new(
            config.replace_attempts,
            Duration::from_millis(config.replace_retry_delay_ms),
        ),
    };

    let summary = BatchController::new(&mut workbook, adapter.as_ref(), &page, options)
        .with_cancel_flag(cancel)
        .with_progress(|progress| match progress {
            Progress::SheetStarted { name, index, total } => {
                println!("\n=== Processing sheet {}/{}: {} ===", index, total, name);
            }
            Progress::RowResolved { row, total, result, .. } => match result.price() {
                Some(price) => {
                    println!("[{}/{}] {} -> {}", row, total, result.identity, price)
                }
                None => println!("[{}/{}] No price found for {}", row, total, result.identity),
            },
            Progress::SheetFinished { matched, total, .. } => {
                println!("Sheet done: {}/{} prices found", matched, total);
            }
        })
        .run()
        .await?;

    if summary.aborted {
        println!(
            "\nRun aborted after {} rows; workbook was NOT modified.",
            summary.rows_processed
        );
    } else {
        println!(
            "\nDone. {} sheets, {} rows, {} matched, {} unmatched.",
            summary.sheets_processed, summary.rows_processed, summary.matched, summary.unmatched
        );
    }

    Ok(())
}
