// src/crawl/sequential.rs
// =============================================================================
// Depth-first crawl on the calling thread.
//
// How it works:
// 1. Stop if the remaining depth is used up
// 2. Stop if the page was already visited
// 3. "Load" the page (sleep for its load time - this blocks the thread)
// 4. Look up its links
// 5. No links: report NONE FOUND
//    Links: for each one in order, report the edge and crawl it fully
//    before moving on to the next
//
// The output order is fully deterministic. The visited set is still needed:
// without it a cycle (A -> B -> A) would be re-fetched until the depth runs
// out at every level.
// =============================================================================

use std::sync::Arc;
use std::time::Instant;

use super::observe::{Observation, ObservationSink};
use super::page::Page;
use super::provider::SuccessorProvider;
use super::visited::VisitedSet;
use super::CrawlSummary;

pub struct SequentialCrawler {
    provider: Arc<dyn SuccessorProvider>,
    sink: Arc<dyn ObservationSink>,
}

impl SequentialCrawler {
    pub fn new(provider: Arc<dyn SuccessorProvider>, sink: Arc<dyn ObservationSink>) -> Self {
        Self { provider, sink }
    }

    /// Crawls from `root` with a fresh visited set. Returns once every
    /// reachable page within `max_depth` has been handled.
    pub fn run(&self, root: &Page, max_depth: i64) -> CrawlSummary {
        log::info!("sequential crawl of {} (depth {})", root.url(), max_depth);

        let visited = VisitedSet::new();
        let start = Instant::now();
        self.crawl(root, max_depth, &visited);

        CrawlSummary {
            visited: visited.len(),
            elapsed: start.elapsed(),
        }
    }

    /// Crawls `page` and everything below it, recursing in link order.
    pub fn crawl(&self, page: &Page, depth: i64, visited: &VisitedSet) {
        if depth <= 0 {
            return;
        }
        if !visited.mark_if_absent(page.url()) {
            log::debug!("already visited {}", page.url());
            return;
        }

        std::thread::sleep(page.load_time());

        let links = self.provider.successors_of(page.url()).unwrap_or_default();
        if links.is_empty() {
            self.sink.emit(Observation::none_found(page.url()));
            return;
        }

        for link in &links {
            self.sink.emit(Observation::edge(page.url(), link.url()));
            self.crawl(link, depth - 1, visited);
        }
    }
}
