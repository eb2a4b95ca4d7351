//! Link-Sweep main entry point
//!
//! This is the command-line interface for the Link-Sweep link mapper.

use anyhow::Context;
use clap::Parser;
use link_sweep::config::{read_config, validate, Config};
use link_sweep::crawler::crawl;
use link_sweep::output::{print_report, write_link_files, CrawlEvent};
use link_sweep::ScopeMatch;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Link-Sweep: an internal/external link mapper
///
/// Link-Sweep crawls every page on the seed URL's domain and writes the
/// internal and external links it finds to two text files.
#[derive(Parser, Debug)]
#[command(name = "link-sweep")]
#[command(version)]
#[command(about = "An internal/external link mapper", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Number of concurrent fetch workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Stop after fetching this many pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Cancel the crawl after this many seconds
    #[arg(long)]
    max_duration_secs: Option<u64>,

    /// Internal-link rule: "substring" or "host-suffix"
    #[arg(long)]
    scope_match: Option<ScopeMatch>,

    /// Maximum concurrent fetches per host
    #[arg(long)]
    per_host_limit: Option<usize>,

    /// Directory for the link files
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line overrides on top of `config`
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.seed = url.clone();
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(timeout) = self.timeout_ms {
            config.crawler.request_timeout_ms = timeout;
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = Some(max_pages);
        }
        if let Some(secs) = self.max_duration_secs {
            config.crawler.max_duration_secs = Some(secs);
        }
        if let Some(mode) = self.scope_match {
            config.crawler.scope_match = mode;
        }
        if let Some(limit) = self.per_host_limit {
            config.crawler.per_host_limit = Some(limit);
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            read_config(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => Config::default(),
    };
    cli.apply(&mut config);
    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("link_sweep=info,warn"),
            1 => EnvFilter::new("link_sweep=debug,info"),
            2 => EnvFilter::new("link_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Link-Sweep Dry Run ===\n");

    println!("Seed: {}", config.seed);

    println!("\nCrawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Request timeout: {}ms", config.crawler.request_timeout_ms);
    println!("  Max body size: {} bytes", config.crawler.max_body_bytes);
    println!("  Scope match: {}", config.crawler.scope_match);
    match config.crawler.max_pages {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unlimited"),
    }
    match config.crawler.max_duration_secs {
        Some(secs) => println!("  Max duration: {}s", secs),
        None => println!("  Max duration: unlimited"),
    }
    match config.crawler.per_host_limit {
        Some(limit) => println!("  Per-host limit: {}", limit),
        None => println!("  Per-host limit: none"),
    }
    println!("  Grace period: {}ms", config.crawler.grace_period_ms);
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);

    println!("\n✓ Configuration is valid");
}

/// Handles the normal crawl mode
async fn handle_crawl(config: Config, quiet: bool) -> anyhow::Result<()> {
    let output_dir = PathBuf::from(&config.output.directory);

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping crawl");
                cancel.cancel();
            }
        })
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(rx, quiet));

    let result = crawl(config, tx, cancel).await;
    ctrl_c.abort();
    // The sender was moved into the crawl and is dropped with it, which ends the printer
    let _ = printer.await;

    let report = result?;
    print_report(&report);
    write_results(&report, &output_dir)?;

    Ok(())
}

fn write_results(report: &link_sweep::CrawlReport, directory: &Path) -> anyhow::Result<()> {
    let files = write_link_files(report, directory)
        .with_context(|| format!("failed to write link files to {}", directory.display()))?;
    println!("\nInternal links: {}", files.internal.display());
    println!("External links: {}", files.external.display());
    Ok(())
}

/// Prints one timestamped console line per event
async fn print_events(mut rx: UnboundedReceiver<CrawlEvent>, quiet: bool) {
    while let Some(event) = rx.recv().await {
        if quiet {
            continue;
        }
        let stamp = event.timestamp().format("%Y-%m-%d %H:%M:%S");
        match &event {
            CrawlEvent::Discovered { scope, url, .. } if scope.is_internal() => {
                println!("[*] {} Internal link: {}", stamp, url);
            }
            CrawlEvent::Discovered { url, .. } => {
                println!("[!] {} External link: {}", stamp, url);
            }
            CrawlEvent::PageStarted { url, .. } => {
                println!("\n[*] {} Crawling: {}", stamp, url);
            }
            CrawlEvent::PageFinished { url, elapsed, .. } => {
                println!(
                    "[*] {} Crawling End: {} Take time: {:.2}(s)",
                    stamp,
                    url,
                    elapsed.as_secs_f64()
                );
            }
            CrawlEvent::PageFailed { url, error, .. } => {
                println!("[!] {} Failed: {} ({})", stamp, url, error);
            }
        }
    }
}
