//! PhishGuard CLI
//!
//! CLI tool for classifying URLs and inspecting phishing datasets.

mod dataset;
mod source;
mod stream;

use std::path::Path;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use pg_core::dataset::{DatasetLoader, LoaderConfig, MatchKind, RefreshOutcome};
use pg_core::{Classification, ClassificationEngine};

use crate::dataset::{read_config, read_dataset, DatasetSummary};
use crate::source::CliSource;
use crate::stream::{run_stream, StreamOptions};

#[derive(Parser)]
#[command(name = "pg-cli")]
#[command(about = "PhishGuard URL classifier and dataset tools")]
struct Cli {
    /// JSON loader config (`source`, `timeout_secs`)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one or more URLs
    Check {
        /// Dataset URL or file (defaults to the maintained feed)
        #[arg(short, long)]
        dataset: Option<String>,

        /// Bound on the dataset fetch
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// URLs to classify
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Validate a dataset file
    Validate {
        /// Dataset file to validate
        #[arg(short, long)]
        input: String,
    },

    /// Dump dataset info
    Info {
        /// Dataset file to inspect
        #[arg(short, long)]
        input: String,

        /// Number of targets to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Classify URLs read from stdin, refreshing the dataset periodically
    Stream {
        /// Dataset URL or file (defaults to the maintained feed)
        #[arg(short, long)]
        dataset: Option<String>,

        /// Bound on each dataset fetch
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Seconds between refreshes
        #[arg(long, default_value_t = 3600)]
        interval_secs: u64,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Check {
            dataset,
            timeout_secs,
            urls,
        } => resolve_config(config, dataset, timeout_secs).and_then(|c| cmd_check(&c, &urls)),
        Commands::Validate { input } => cmd_validate(&input),
        Commands::Info { input, top } => cmd_info(&input, top),
        Commands::Stream {
            dataset,
            timeout_secs,
            interval_secs,
        } => resolve_config(config, dataset, timeout_secs).and_then(|c| cmd_stream(&c, interval_secs)),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Config file first, then flags on top.
fn resolve_config(
    path: Option<&str>,
    dataset: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<LoaderConfig, String> {
    let mut config = match path {
        Some(path) => read_config(Path::new(path))?,
        None => LoaderConfig::default(),
    };
    if let Some(dataset) = dataset {
        config.source = dataset;
    }
    if let Some(timeout_secs) = timeout_secs {
        config.timeout_secs = timeout_secs;
    }
    if config.timeout_secs == 0 {
        return Err("Timeout must be at least one second".to_string());
    }
    Ok(config)
}

fn cmd_check(config: &LoaderConfig, urls: &[String]) -> Result<(), String> {
    let engine = ClassificationEngine::with_loader(DatasetLoader::from_config(config));
    let source = CliSource::parse(&config.source)?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;
    let outcome = runtime.block_on(engine.refresh(&source));
    if let RefreshOutcome::SeedFallback(e) = &outcome {
        eprintln!("Warning: dataset unavailable ({e}); only heuristics and the seed record apply");
    }

    for url in urls {
        let classification = engine.classify_url(url);
        println!("{}", verdict_json(url, &classification));
    }

    Ok(())
}

fn cmd_validate(input: &str) -> Result<(), String> {
    let (snapshot, stats, size) = read_dataset(Path::new(input))?;

    println!("Dataset '{}' is valid", input);
    println!("  Records:     {}", stats.total);
    println!("  Accepted:    {}", stats.accepted);
    println!("  Dropped:     {}", stats.dropped);
    println!("  Overwritten: {}", stats.overwritten);
    println!("  Entries:     {}", snapshot.len());
    println!("  Size:        {} bytes", size);

    Ok(())
}

fn cmd_info(input: &str, top: usize) -> Result<(), String> {
    let (snapshot, stats, size) = read_dataset(Path::new(input))?;
    let summary = DatasetSummary::from_snapshot(&snapshot);

    println!("Dataset: {}", input);
    println!("  Entries:     {}", summary.entries);
    println!("  Dropped:     {}", stats.dropped);
    println!("  Total size:  {} bytes ({:.1} KB)", size, size as f64 / 1024.0);
    println!();

    println!("Status:");
    println!("  Verified:    {}", summary.verified);
    println!("  Unverified:  {}", summary.unverified);
    println!("  Online:      {}", summary.online);
    println!();

    println!("Targets ({} distinct):", summary.by_target.len());
    for (target, count) in summary.top_targets(top) {
        println!("  {:<24} {}", target, count);
    }

    Ok(())
}

fn cmd_stream(config: &LoaderConfig, interval_secs: u64) -> Result<(), String> {
    if interval_secs == 0 {
        return Err("Refresh interval must be at least one second".to_string());
    }
    let engine = ClassificationEngine::with_loader(DatasetLoader::from_config(config));
    let source = CliSource::parse(&config.source)?;
    run_stream(
        engine,
        StreamOptions {
            source,
            interval: Duration::from_secs(interval_secs),
        },
    )
}

/// One output line per classified URL.
pub(crate) fn verdict_json(url: &str, classification: &Classification) -> Value {
    let matched = match classification {
        Classification::Heuristic { rule, .. } => format!("heuristic:{}", rule.as_str()),
        Classification::Dataset { matched: MatchKind::Exact, .. } => "dataset:exact".to_string(),
        Classification::Dataset { matched: MatchKind::Suffix(key), .. } => format!("dataset:suffix:{}", key),
        Classification::Clean { .. } => "clean".to_string(),
        Classification::InvalidUrl(_) => "invalid-url".to_string(),
    };

    json!({
        "url": url,
        "match": matched,
        "threat": classification.threat(),
    })
}
