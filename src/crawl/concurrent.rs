// src/crawl/concurrent.rs
// =============================================================================
// Crawl where every discovered link becomes its own tokio task (a "branch").
//
// How it works:
// 1. Same checks as the sequential crawler: depth, then visited
// 2. Wait for a fetch permit, sleep for the page's load time, look up links
//    (only this branch waits; other branches keep running)
// 3. For each link in order: report the edge, register a branch with the
//    coordinator, spawn it
// 4. The caller crawls the root itself, then waits on the coordinator until
//    every spawned branch has returned
//
// Bounding the work:
// - Spawning a task per link is cheap, but a wide site would otherwise have
//   every branch sleeping/fetching at once. A semaphore caps how many branches
//   are inside step 2 at the same time (max_concurrent).
// - The permit is released before children are spawned, so a parent never
//   holds capacity its children are waiting for.
//
// Ordering:
// - Edges from one parent come out in link order
// - Output from different branches interleaves in any order
// =============================================================================

use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::Semaphore;

use super::coordinator::CompletionCoordinator;
use super::observe::{Observation, ObservationSink};
use super::page::Page;
use super::provider::SuccessorProvider;
use super::visited::VisitedSet;
use super::CrawlSummary;

/// Default cap on branches fetching at the same time
pub const DEFAULT_MAX_CONCURRENT: usize = 64;

pub struct ConcurrentCrawler {
    provider: Arc<dyn SuccessorProvider>,
    sink: Arc<dyn ObservationSink>,
    max_concurrent: usize,
}

impl ConcurrentCrawler {
    pub fn new(provider: Arc<dyn SuccessorProvider>, sink: Arc<dyn ObservationSink>) -> Self {
        Self {
            provider,
            sink,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Sets how many branches may fetch at once, capped at the semaphore
    /// limit.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.min(Semaphore::MAX_PERMITS);
        self
    }

    /// Crawls from `root` and returns once every spawned branch is done.
    ///
    /// Each call gets its own visited set and coordinator.
    pub async fn run(&self, root: &Page, max_depth: i64) -> CrawlSummary {
        log::info!(
            "concurrent crawl of {} (depth {}, max {} fetching)",
            root.url(),
            max_depth,
            self.max_concurrent
        );

        let traversal = Traversal::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.sink),
            self.max_concurrent,
        );
        let start = Instant::now();

        // The root is not a registered branch: crawl it here, then wait for
        // everything it spawned.
        traversal.crawl(root.clone(), max_depth).await;
        traversal.await_all_complete().await;

        CrawlSummary {
            visited: traversal.visited().len(),
            elapsed: start.elapsed(),
        }
    }
}

/// Shared state of one concurrent crawl run.
pub struct Traversal {
    provider: Arc<dyn SuccessorProvider>,
    sink: Arc<dyn ObservationSink>,
    visited: VisitedSet,
    coordinator: Arc<CompletionCoordinator>,
    fetch_permits: Semaphore,
}

impl Traversal {
    /// `max_concurrent` is clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn new(
        provider: Arc<dyn SuccessorProvider>,
        sink: Arc<dyn ObservationSink>,
        max_concurrent: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            provider,
            sink,
            visited: VisitedSet::new(),
            coordinator: Arc::new(CompletionCoordinator::new()),
            fetch_permits: Semaphore::new(max_concurrent.clamp(1, Semaphore::MAX_PERMITS)),
        })
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn coordinator(&self) -> &CompletionCoordinator {
        &self.coordinator
    }

    /// Waits until every branch spawned by this run has returned.
    pub async fn await_all_complete(&self) {
        self.coordinator.await_all_complete().await;
    }

    /// Crawls one page and spawns a branch for each of its links.
    ///
    /// The returned future finishes when this page is handled; its children
    /// may still be running. Boxed because branches spawn more branches of
    /// the same future type.
    pub fn crawl(self: &Arc<Self>, page: Page, depth: i64) -> BoxFuture<'static, ()> {
        let this = Arc::clone(self);

        async move {
            if depth <= 0 {
                return;
            }
            // Claimed before any waiting, so two branches racing on the same
            // page cannot both fetch it.
            if !this.visited.mark_if_absent(page.url()) {
                log::debug!("already visited {}", page.url());
                return;
            }

            let links = {
                let Ok(_permit) = this.fetch_permits.acquire().await else {
                    log::error!("fetch permits closed, dropping {}", page.url());
                    return;
                };
                tokio::time::sleep(page.load_time()).await;
                this.provider.successors_of(page.url()).unwrap_or_default()
            };

            if links.is_empty() {
                this.sink.emit(Observation::none_found(page.url()));
                return;
            }

            for link in links {
                this.sink.emit(Observation::edge(page.url(), link.url()));
                this.spawn_branch(link, depth - 1);
            }
        }
        .boxed()
    }

    fn spawn_branch(self: &Arc<Self>, page: Page, depth: i64) {
        // Registered before the task exists; the guard moves into the task
        // and deregisters whenever it finishes.
        let guard = self.coordinator.register_branch();
        let branch = self.crawl(page, depth);

        tokio::spawn(async move {
            let _guard = guard;
            branch.await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::observe::CollectingSink;
    use crate::crawl::provider::SiteMap;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    fn page(url: &str) -> Page {
        Page::from_millis(url, 0)
    }

    fn edge(from: &str, to: &str) -> String {
        Observation::edge(from, to).to_string()
    }

    fn none_found(url: &str) -> String {
        Observation::none_found(url).to_string()
    }

    // Counts how often each page's links are looked up, i.e. how often the
    // page was actually fetched.
    struct CountingProvider {
        site: SiteMap,
        lookups: Mutex<HashMap<String, usize>>,
    }

    impl CountingProvider {
        fn new(site: SiteMap) -> Self {
            Self { site, lookups: Mutex::new(HashMap::new()) }
        }

        fn lookups(&self) -> HashMap<String, usize> {
            self.lookups.lock().unwrap().clone()
        }
    }

    impl SuccessorProvider for CountingProvider {
        fn successors_of(&self, url: &str) -> Option<Vec<Page>> {
            *self.lookups.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
            self.site.successors_of(url)
        }
    }

    async fn crawl(site: SiteMap, root: Page, depth: i64) -> (Vec<String>, CrawlSummary) {
        let sink = Arc::new(CollectingSink::new());
        let crawler = ConcurrentCrawler::new(Arc::new(site), sink.clone());
        let summary = crawler.run(&root, depth).await;
        (sink.lines(), summary)
    }

    fn sorted(mut lines: Vec<String>) -> Vec<String> {
        lines.sort();
        lines
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_leaves() {
        let site = SiteMap::new()
            .with_links("R", vec![page("A"), page("B")])
            .with_links("A", vec![])
            .with_links("B", vec![]);

        let (lines, summary) = crawl(site, page("R"), 2).await;

        assert_eq!(
            sorted(lines.clone()),
            sorted(vec![edge("R", "A"), none_found("A"), edge("R", "B"), none_found("B")])
        );
        let position = |line: String| lines.iter().position(|l| *l == line).unwrap();
        assert!(position(edge("R", "A")) < position(edge("R", "B")));
        assert_eq!(summary.visited, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_back_edge_to_visited_root() {
        let site = SiteMap::new()
            .with_links("A", vec![page("B"), page("C")])
            .with_links("B", vec![page("A")])
            .with_links("C", vec![]);
        let provider = Arc::new(CountingProvider::new(site));
        let sink = Arc::new(CollectingSink::new());

        ConcurrentCrawler::new(provider.clone(), sink.clone())
            .run(&page("A"), 2)
            .await;

        assert_eq!(
            sorted(sink.lines()),
            sorted(vec![edge("A", "B"), edge("A", "C"), edge("B", "A"), none_found("C")])
        );
        assert_eq!(provider.lookups().get("A"), Some(&1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_shared_child_fetched_once() {
        // Many parents race to reach the same page
        let parents: Vec<Page> = (0..20).map(|i| page(&format!("P{}", i))).collect();
        let mut site = SiteMap::new().with_links("root", parents.clone());
        for parent in &parents {
            site.insert(parent.url(), vec![Page::from_millis("shared", 5)]);
        }
        site.insert("shared", vec![page("leaf")]);

        let provider = Arc::new(CountingProvider::new(site));
        let sink = Arc::new(CollectingSink::new());

        let summary = ConcurrentCrawler::new(provider.clone(), sink.clone())
            .run(&page("root"), 4)
            .await;

        let lookups = provider.lookups();
        assert!(lookups.values().all(|&n| n == 1), "refetched: {:?}", lookups);
        assert_eq!(lookups.get("shared"), Some(&1));

        let lines = sink.lines();
        assert_eq!(lines.iter().filter(|l| **l == edge("shared", "leaf")).count(), 1);
        assert_eq!(lines.iter().filter(|l| **l == none_found("leaf")).count(), 1);
        // root + 20 parents + shared + leaf
        assert_eq!(summary.visited, 23);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_edges_of_one_parent_keep_link_order() {
        let links: Vec<Page> = (0..10).map(|i| page(&format!("L{}", i))).collect();
        let site = SiteMap::new().with_links("R", links);

        let (lines, _) = crawl(site, page("R"), 2).await;

        let edges: Vec<&String> = lines.iter().filter(|l| l.starts_with("[R]")).collect();
        let expected: Vec<String> = (0..10).map(|i| edge("R", &format!("L{}", i))).collect();
        assert_eq!(edges, expected.iter().collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_depth_bound_stops_fetching() {
        let site = SiteMap::new()
            .with_links("A", vec![page("B")])
            .with_links("B", vec![page("C")])
            .with_links("C", vec![page("D")]);
        let provider = Arc::new(CountingProvider::new(site));
        let sink = Arc::new(CollectingSink::new());

        ConcurrentCrawler::new(provider.clone(), sink.clone())
            .run(&page("A"), 2)
            .await;

        assert_eq!(sink.lines(), vec![edge("A", "B"), edge("B", "C")]);
        assert!(!provider.lookups().contains_key("C"));
    }

    #[tokio::test]
    async fn test_zero_depth_is_noop() {
        let site = SiteMap::new().with_links("A", vec![page("B")]);
        let (lines, summary) = crawl(site, page("A"), 0).await;
        assert!(lines.is_empty());
        assert_eq!(summary.visited, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_dense_cycle_terminates() {
        // Every node links to every node
        let nodes: Vec<Page> = (0..6).map(|i| page(&format!("N{}", i))).collect();
        let mut site = SiteMap::new();
        for node in &nodes {
            site.insert(node.url(), nodes.clone());
        }

        let (lines, summary) = crawl(site, page("N0"), 100).await;

        // Each node is fetched once and reports all 6 links
        assert_eq!(summary.visited, 6);
        assert_eq!(lines.len(), 36);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_traversal_leaves_nothing_outstanding() {
        let site = SiteMap::new()
            .with_links("A", vec![Page::from_millis("B", 10), Page::from_millis("C", 20)])
            .with_links("B", vec![Page::from_millis("D", 10)])
            .with_links("C", vec![Page::from_millis("D", 10)]);
        let sink = Arc::new(CollectingSink::new());
        let traversal = Traversal::new(Arc::new(site), sink.clone(), 4);

        traversal.crawl(page("A"), 5).await;
        traversal.await_all_complete().await;

        assert_eq!(traversal.coordinator().outstanding(), 0);
        assert!(traversal.visited().contains("D"));
        assert_eq!(
            sink.lines().iter().filter(|l| **l == none_found("D")).count(),
            1
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_siblings_load_in_parallel() {
        let leaves: Vec<Page> = (0..10).map(|i| Page::from_millis(format!("L{}", i), 100)).collect();
        let site = SiteMap::new().with_links("R", leaves);

        let (_, summary) = crawl(site, page("R"), 2).await;

        // One after another this would take a full second
        assert!(summary.elapsed < Duration::from_millis(800), "{:?}", summary.elapsed);
    }

    #[tokio::test]
    async fn test_out_of_range_max_concurrent_is_clamped() {
        let site = SiteMap::new().with_links("A", vec![page("B")]);

        for max_concurrent in [0, usize::MAX] {
            let sink = Arc::new(CollectingSink::new());
            let summary = ConcurrentCrawler::new(Arc::new(site.clone()), sink.clone())
                .with_max_concurrent(max_concurrent)
                .run(&page("A"), 2)
                .await;

            assert_eq!(summary.visited, 2);
            assert_eq!(sink.lines(), vec![edge("A", "B"), none_found("B")]);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_max_concurrent_limits_parallel_loads() {
        let leaves: Vec<Page> = (0..4).map(|i| Page::from_millis(format!("L{}", i), 50)).collect();
        let site = SiteMap::new().with_links("R", leaves);
        let sink = Arc::new(CollectingSink::new());

        let summary = ConcurrentCrawler::new(Arc::new(site), sink)
            .with_max_concurrent(1)
            .run(&page("R"), 2)
            .await;

        // With a single permit the four loads cannot overlap
        assert!(summary.elapsed >= Duration::from_millis(200), "{:?}", summary.elapsed);
    }
}
