// src/crawl/mod.rs
// =============================================================================
// This module crawls a site graph starting from a root page.
//
// Submodules:
// - page: the Page type (URL + simulated load time)
// - provider: where a page's links come from (SuccessorProvider, SiteMap)
// - visited: the per-run set of pages already claimed
// - observe: what gets reported (edges, NONE FOUND) and where it goes
// - coordinator: counts outstanding branches of a concurrent crawl
// - sequential / concurrent: the two crawlers
//
// Both crawlers follow the same rules: stop at the depth bound, visit each
// page at most once, report every link of a visited page in order.
// =============================================================================

mod concurrent;
mod coordinator;
mod observe;
mod page;
mod provider;
mod sequential;
mod visited;

use std::time::Duration;

use serde::Serialize;

pub use concurrent::{ConcurrentCrawler, Traversal, DEFAULT_MAX_CONCURRENT};
pub use coordinator::{BranchGuard, CompletionCoordinator};
pub use observe::{CollectingSink, Observation, ObservationSink, StdoutSink};
pub use page::Page;
pub use provider::{SiteMap, SuccessorProvider};
pub use sequential::SequentialCrawler;
pub use visited::VisitedSet;

/// Which crawler to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlMode {
    Sequential,
    Concurrent,
}

/// What a finished run reports back
#[derive(Debug, Clone, Copy)]
pub struct CrawlSummary {
    /// Distinct pages that were fetched
    pub visited: usize,
    /// Wall-clock time from start until every branch finished
    pub elapsed: Duration,
}

/// Everything about a run, for --json output
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub mode: CrawlMode,
    pub root: Page,
    pub depth: i64,
    pub visited: usize,
    pub elapsed_ms: u64,
    pub observations: Vec<Observation>,
}

impl CrawlReport {
    pub fn new(
        mode: CrawlMode,
        root: Page,
        depth: i64,
        summary: CrawlSummary,
        observations: Vec<Observation>,
    ) -> Self {
        Self {
            mode,
            root,
            depth,
            visited: summary.visited,
            elapsed_ms: u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
            observations,
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why two crawlers instead of one with a flag?
//    - The sequential one is plain recursion on one thread; its output order
//      is fixed, which makes it easy to reason about
//    - The concurrent one needs shared state (Arc), a coordinator and boxed
//      futures; mixing both into one function would hide the difference
//
// 2. Why is the visited set per run?
//    - A global set would leak between runs: a second crawl would find every
//      page "already visited" and report nothing
//
// 3. Why does Edge get reported for pages that are never fetched?
//    - A link is reported when it is found, before the child checks the depth
//      bound or the visited set. The link exists even if we don't follow it.
// -----------------------------------------------------------------------------
