// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr) so it never mixes with the crawl output (stdout)
// 3. Load the config file and apply command-line overrides
// 4. Run the chosen crawler and time it
// 5. Print the elapsed time, or a JSON report with --json
// 6. Exit with 0 on success, 2 on error
// =============================================================================

mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands, DEFAULT_CONFIG_FILE};
use page_crawler::config::Config;
use page_crawler::crawl::{
    CollectingSink, ConcurrentCrawler, CrawlMode, CrawlReport, CrawlSummary, ObservationSink,
    Page, SequentialCrawler, SiteMap, StdoutSink,
};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Sequential { run } => {
            config.apply(run.overrides(None));
            handle_sequential(&config, run.json).await
        }
        Commands::Concurrent { run, max_concurrent } => {
            config.apply(run.overrides(max_concurrent));
            handle_concurrent(&config, run.json).await
        }
    }
}

/// Initialize logging based on verbosity flag. RUST_LOG still wins.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

// An explicit --config must load; the default file is optional.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(Config::load_or_default(DEFAULT_CONFIG_FILE)),
    }
}

/// Everything a crawler needs, checked up front
struct CrawlSetup {
    root: Page,
    depth: i64,
    site: Arc<SiteMap>,
    sink: Arc<dyn ObservationSink>,
    collector: Option<Arc<CollectingSink>>,
}

impl CrawlSetup {
    fn from_config(config: &Config, json: bool) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        // With --json the lines are collected for the report instead of
        // being printed as they happen
        let collector = json.then(|| Arc::new(CollectingSink::new()));
        let sink: Arc<dyn ObservationSink> = match &collector {
            Some(collector) => Arc::clone(collector) as Arc<dyn ObservationSink>,
            None => Arc::new(StdoutSink),
        };

        Ok(Self {
            root: config.root_page()?,
            depth: config.crawler.depth,
            site: Arc::new(config.site_map()?),
            sink,
            collector,
        })
    }
}

async fn handle_sequential(config: &Config, json: bool) -> Result<i32> {
    let setup = CrawlSetup::from_config(config, json)?;
    log::info!("🔍 Crawling {} sequentially", setup.root.url());

    let crawler = SequentialCrawler::new(setup.site.clone(), setup.sink.clone());
    let root = setup.root.clone();
    let depth = setup.depth;

    // The sequential crawler sleeps on its thread, so keep it off the
    // async workers
    let summary = tokio::task::spawn_blocking(move || crawler.run(&root, depth))
        .await
        .context("sequential crawl panicked")?;

    print_report(CrawlMode::Sequential, setup, summary)?;
    Ok(0)
}

async fn handle_concurrent(config: &Config, json: bool) -> Result<i32> {
    let setup = CrawlSetup::from_config(config, json)?;
    log::info!("🔍 Crawling {} concurrently", setup.root.url());

    let summary = ConcurrentCrawler::new(setup.site.clone(), setup.sink.clone())
        .with_max_concurrent(config.crawler.max_concurrent)
        .run(&setup.root, setup.depth)
        .await;

    print_report(CrawlMode::Concurrent, setup, summary)?;
    Ok(0)
}

fn print_report(mode: CrawlMode, setup: CrawlSetup, summary: CrawlSummary) -> Result<()> {
    match setup.collector {
        Some(collector) => {
            let report = CrawlReport::new(
                mode,
                setup.root,
                setup.depth,
                summary,
                collector.observations(),
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        None => {
            println!();
            println!("⏱️  {:?} ({} page(s) visited)", summary.elapsed, summary.visited);
        }
    }
    Ok(())
}
