// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands, one per crawler:
//   page-crawler sequential --depth 3
//   page-crawler concurrent --depth 4 --max-concurrent 16 --json
//
// Global options (--config, --verbose) work with either subcommand. Flags
// that are left out fall back to the config file, then to built-in defaults.
// =============================================================================

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use page_crawler::config::Overrides;

/// Config file picked up from the working directory when --config is absent
pub const DEFAULT_CONFIG_FILE: &str = "page-crawler.toml";

#[derive(Parser, Debug)]
#[command(
    name = "page-crawler",
    version,
    about = "Crawl a mock site graph, one page at a time or with concurrent branches",
    long_about = "page-crawler walks a site graph from a root page down to a depth bound, \
                  visiting every page at most once and printing each link it finds. \
                  Page loads are simulated with a per-page delay."
)]
pub struct Cli {
    /// Path to a TOML file with crawler settings and the site graph
    ///
    /// If omitted, ./page-crawler.toml is used when it exists
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl depth-first on a single thread; output order is deterministic
    ///
    /// Example: page-crawler sequential --depth 3
    Sequential {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Crawl with one concurrent branch per discovered link
    ///
    /// Example: page-crawler concurrent --depth 4 --max-concurrent 16
    Concurrent {
        #[command(flatten)]
        run: RunArgs,

        /// Maximum number of branches loading pages at the same time
        #[arg(long)]
        max_concurrent: Option<usize>,
    },
}

/// Options shared by both subcommands
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Maximum crawl depth (1 = just the root page)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub depth: Option<u32>,

    /// URL of the page to start from
    #[arg(long)]
    pub root: Option<String>,

    /// Simulated load time of the root page, in milliseconds
    #[arg(long)]
    pub root_load_ms: Option<u32>,

    /// Output a JSON report instead of lines
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn overrides(&self, max_concurrent: Option<usize>) -> Overrides {
        Overrides {
            depth: self.depth.map(i64::from),
            root_url: self.root.clone(),
            root_load_time_ms: self.root_load_ms.map(i64::from),
            max_concurrent,
        }
    }
}
