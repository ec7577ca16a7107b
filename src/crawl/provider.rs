// src/crawl/provider.rs
// =============================================================================
// Where the crawler learns which pages a page links to.
//
// In a real crawler this would download the page and extract its links. Here
// the links come from an in-memory site map, looked up by URL. The provider
// only answers "what does this page link to?" - it never tracks what has
// been visited and never recurses.
// =============================================================================

use std::collections::HashMap;

use super::page::Page;

/// Lookup of a page's outgoing links.
///
/// The returned order matters: the crawler reports and follows links in
/// exactly this order. `None` means the page is unknown; the crawler treats
/// it the same as a page with no links.
pub trait SuccessorProvider: Send + Sync {
    fn successors_of(&self, url: &str) -> Option<Vec<Page>>;
}

/// An in-memory site: URL -> ordered list of linked pages.
#[derive(Debug, Clone, Default)]
pub struct SiteMap {
    links: HashMap<String, Vec<Page>>,
}

impl SiteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the outgoing links of `url`, replacing any previous entry.
    pub fn insert(&mut self, url: impl Into<String>, links: Vec<Page>) {
        self.links.insert(url.into(), links);
    }

    /// Builder-style variant of [`SiteMap::insert`].
    pub fn with_links(mut self, url: impl Into<String>, links: Vec<Page>) -> Self {
        self.insert(url, links);
        self
    }

    /// Number of pages that have an entry.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// The mock golang.org site used when no graph is configured.
    ///
    /// Several pages link back to the root and to each other, so any crawl
    /// of it depends on the visited set to stay finite.
    pub fn golang() -> Self {
        let page = |url: &str, load_time_ms: u64| Page::from_millis(url, load_time_ms);

        Self::new()
            .with_links(
                "https://golang.org/",
                vec![
                    page("https://golang.org/pkg/", 1000),
                    page("https://golang.org/cmd/", 900),
                ],
            )
            .with_links(
                "https://golang.org/pkg/",
                vec![
                    page("https://golang.org/", 500),
                    page("https://golang.org/cmd/", 900),
                    page("https://golang.org/pkg/fmt/", 1500),
                    page("https://golang.org/pkg/os/", 1400),
                    page("https://golang.org/pkg/strconv/", 2000),
                    page("https://golang.org/pkg/crypto/", 1200),
                    page("https://golang.org/pkg/image/", 1900),
                ],
            )
            .with_links(
                "https://golang.org/pkg/fmt/",
                vec![
                    page("https://golang.org/", 500),
                    page("https://golang.org/pkg/", 1000),
                ],
            )
            .with_links(
                "https://golang.org/pkg/os/",
                vec![
                    page("https://golang.org/", 500),
                    page("https://golang.org/pkg/", 1000),
                ],
            )
            .with_links(
                "https://golang.org/pkg/image/",
                vec![
                    page("https://golang.org/pkg/image/Alpha", 1400),
                    page("https://golang.org/pkg/image/Alpha16", 1600),
                    page("https://golang.org/pkg/image/CMYK", 1300),
                    page("https://golang.org/pkg/image/Config", 1500),
                ],
            )
    }
}

impl SuccessorProvider for SiteMap {
    fn successors_of(&self, url: &str) -> Option<Vec<Page>> {
        self.links.get(url).cloned()
    }
}
