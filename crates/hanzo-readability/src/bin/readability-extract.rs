//! CLI for extracting the readable version of an archived page
//!
//! Usage:
//!   readability-extract https://example.com --out-dir ./archive/1700000000

use anyhow::{Context, Result};
use clap::Parser;
use hanzo_readability::{HttpDocumentSource, Link, ReadabilityConfig, ReadabilityExtractor};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "readability-extract")]
#[command(about = "Save a reader-friendly copy of a page using readability-extractor")]
struct Args {
    /// URL of the page to extract
    url: String,

    /// Link directory; artifacts go to <out-dir>/readability
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Timeout in seconds (defaults to the configured TIMEOUT)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Path to the readability-extractor binary
    #[arg(short, long)]
    binary: Option<PathBuf>,

    /// Extractor version recorded in the result
    #[arg(long)]
    version_string: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extract even if an article was already saved
    #[arg(short, long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ReadabilityConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ReadabilityConfig::default(),
    };
    let mut config = config.apply_env();
    if let Some(binary) = args.binary {
        config = config.with_binary(binary);
    }
    if let Some(version) = args.version_string {
        config = config.with_version(version);
    }

    let source = HttpDocumentSource::new(&config).context("building HTTP client")?;
    let extractor = ReadabilityExtractor::new(config, Arc::new(source));
    let link = Link::new(args.url, args.out_dir);

    if !args.force && !extractor.should_extract(&link, None) {
        eprintln!(
            "Skipping {}: readability disabled or already saved in {}",
            link.url,
            ReadabilityExtractor::output_folder(&link, None).display()
        );
        return Ok(());
    }

    let result = extractor
        .extract(&link, None, args.timeout.map(Duration::from_secs))
        .await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.is_failed() {
        std::process::exit(1);
    }
    Ok(())
}
