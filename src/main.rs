//! SiteHarvest main entry point
//!
//! This is the command-line interface for the SiteHarvest site crawler.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use siteharvest::config::{load_config_with_hash, validate, Config, StorageBackend};
use siteharvest::crawler::{sanitize_company_name, scrape, ScrapeRequest};
use siteharvest::output::{print_statistics, CrawlStatistics, ScrapeResponse};
use siteharvest::storage::open_store;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SiteHarvest: a single-site crawler and structured data harvester
///
/// SiteHarvest crawls a website from a seed URL, follows same-domain links up
/// to a bounded depth and stores the text, images, contact details, products,
/// social links and metadata it finds.
#[derive(Parser, Debug)]
#[command(name = "siteharvest")]
#[command(version = "1.0.0")]
#[command(about = "A single-site crawler and structured data harvester", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Company name (derived from the URL host when omitted)
    #[arg(long)]
    company: Option<String>,

    /// Maximum link depth from the seed (1-5)
    #[arg(long)]
    max_depth: Option<u32>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Storage backend (overrides the config file)
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Output folder (local), database file (sqlite) or bucket name (s3)
    #[arg(long, value_name = "PATH")]
    output: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the request and show the effective configuration without crawling
    #[arg(long)]
    dry_run: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Backend {
    Local,
    Sqlite,
    S3,
}

impl From<Backend> for StorageBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Local => StorageBackend::Local,
            Backend::Sqlite => StorageBackend::Sqlite,
            Backend::S3 => StorageBackend::S3,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_configuration(&cli)?;
    let request = ScrapeRequest {
        seed_url: cli.url.clone(),
        company_name: cli.company.clone(),
        max_depth: cli.max_depth,
    };

    if cli.dry_run {
        handle_dry_run(&config, &request)?;
        return Ok(());
    }

    let response = handle_scrape(&config, config_hash, &request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("siteharvest=info,warn"),
            1 => EnvFilter::new("siteharvest=debug,info"),
            2 => EnvFilter::new("siteharvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (or defaults) and applies command-line overrides
fn load_configuration(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(backend) = cli.backend {
        config.output.backend = backend.into();
    }
    if let Some(output) = &cli.output {
        match config.output.backend {
            StorageBackend::Local => config.output.base_path = output.clone(),
            StorageBackend::Sqlite => config.output.database_path = output.clone(),
            StorageBackend::S3 => config.output.s3_bucket = output.clone(),
        }
    }

    validate(&config).context("Invalid configuration")?;
    Ok((config, config_hash))
}

/// Handles the --dry-run mode: validates the request and shows what would be crawled
fn handle_dry_run(config: &Config, request: &ScrapeRequest) -> anyhow::Result<()> {
    let seed = request.validate().context("Invalid request")?;
    let company = request.resolved_company_name(seed.as_url());
    let config = request.effective_config(config);

    println!("=== SiteHarvest Dry Run ===\n");

    println!("Request:");
    println!("  Seed URL: {}", seed);
    println!("  Company: {} (storage key: {})", company, sanitize_company_name(&company));

    println!("\nCrawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max concurrent requests: {}", config.crawler.max_concurrent_requests);
    println!("  Page timeout: {}s", config.crawler.page_timeout_secs);
    println!("  Crawl timeout: {}s", config.crawler.crawl_timeout_secs);
    println!(
        "  Retries: {} (base delay {}ms)",
        config.crawler.max_retries, config.crawler.retry_delay_ms
    );
    println!("  Strip query: {}", config.crawler.strip_query);
    println!("  Same host only: {}", config.crawler.same_host_only);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    match config.output.backend {
        StorageBackend::Local => println!("  Local folder: {}", config.output.base_path),
        StorageBackend::Sqlite => println!("  SQLite database: {}", config.output.database_path),
        StorageBackend::S3 => println!(
            "  S3 bucket: {} ({})",
            config.output.s3_bucket, config.output.s3_region
        ),
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling at {}", seed);

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(
    config: &Config,
    config_hash: Option<String>,
    request: &ScrapeRequest,
) -> anyhow::Result<ScrapeResponse> {
    let mut store = open_store(&config.output).context("Failed to open result store")?;

    let response = scrape(config, request, config_hash, store.as_mut()).await;
    match &response.metadata {
        Some(metadata) if response.is_success() => {
            tracing::info!(
                "Scrape of {} completed: {} pages",
                metadata.source_url,
                metadata.total_pages_crawled
            );
        }
        _ => tracing::error!(
            "Scrape failed: {}",
            response.error_message.as_deref().unwrap_or("unknown error")
        ),
    }

    if let Some(stats) = CrawlStatistics::from_response(&response) {
        print_statistics(&stats);
    }

    Ok(response)
}
