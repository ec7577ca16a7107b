// src/config.rs
// =============================================================================
// Crawler settings and the site graph, read from an optional TOML file.
//
// Example file:
//
//   [crawler]
//   depth = 4
//   max_concurrent = 64
//
//   [root]
//   url = "https://golang.org/"
//   load_time_ms = 500
//
//   [[pages]]
//   url = "https://golang.org/"
//   links = [{ url = "https://golang.org/pkg/", load_time_ms = 1000 }]
//
// Every section is optional. Without [[pages]] the built-in golang.org mock
// site is used. Command-line flags override whatever the file says.
// =============================================================================

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::crawl::{Page, SiteMap, DEFAULT_MAX_CONCURRENT};
use crate::error::{CrawlError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Depth and concurrency settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Where the crawl starts
    #[serde(default)]
    pub root: RootConfig,

    /// Site graph; `None` means the built-in golang.org site
    #[serde(default)]
    pub pages: Option<Vec<PageLinks>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of link hops from the root (the root itself is 1)
    #[serde(default = "defaults::depth")]
    pub depth: i64,

    /// Maximum branches loading pages at once in concurrent mode
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            depth: defaults::depth(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootConfig {
    #[serde(default = "defaults::root_url")]
    pub url: String,

    #[serde(default = "defaults::root_load_time")]
    pub load_time_ms: i64,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            url: defaults::root_url(),
            load_time_ms: defaults::root_load_time(),
        }
    }
}

/// One page of the site graph and its outgoing links, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLinks {
    pub url: String,
    #[serde(default)]
    pub links: Vec<LinkConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub url: String,
    #[serde(default)]
    pub load_time_ms: i64,
}

/// Values given on the command line, applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub depth: Option<i64>,
    pub root_url: Option<String>,
    pub root_load_time_ms: Option<i64>,
    pub max_concurrent: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, falling back to defaults.
    ///
    /// A missing file is normal and silent; a file that exists but can't be
    /// read or parsed is reported as a warning.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Self::default();
        }

        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Config load failed from {:?}: {}. Using defaults.", path, e);
            Self::default()
        })
    }

    /// Replace file values with any command-line values.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(depth) = overrides.depth {
            self.crawler.depth = depth;
        }
        if let Some(max_concurrent) = overrides.max_concurrent {
            self.crawler.max_concurrent = max_concurrent;
        }
        if let Some(url) = overrides.root_url {
            self.root.url = url;
        }
        if let Some(load_time_ms) = overrides.root_load_time_ms {
            self.root.load_time_ms = load_time_ms;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.depth <= 0 {
            return Err(CrawlError::validation("crawler.depth must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(CrawlError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.crawler.max_concurrent > Semaphore::MAX_PERMITS {
            return Err(CrawlError::validation(format!(
                "crawler.max_concurrent must be <= {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if self.root.url.trim().is_empty() {
            return Err(CrawlError::validation("root.url is empty"));
        }

        self.root_page()?;
        self.site_map()?;
        Ok(())
    }

    pub fn root_page(&self) -> Result<Page> {
        Page::new(self.root.url.clone(), self.root.load_time_ms)
    }

    /// Build the site graph, checking every link's load time.
    pub fn site_map(&self) -> Result<SiteMap> {
        let Some(pages) = &self.pages else {
            return Ok(SiteMap::golang());
        };

        let mut site = SiteMap::new();
        let mut seen = HashSet::new();
        for entry in pages {
            if entry.url.trim().is_empty() {
                return Err(CrawlError::config("a [[pages]] entry has an empty url"));
            }
            if !seen.insert(entry.url.as_str()) {
                return Err(CrawlError::config(format!(
                    "duplicate [[pages]] entry for '{}'",
                    entry.url
                )));
            }
            let links = entry
                .links
                .iter()
                .map(|link| Page::new(link.url.clone(), link.load_time_ms))
                .collect::<Result<Vec<_>>>()?;
            site.insert(entry.url.clone(), links);
        }
        Ok(site)
    }
}

mod defaults {
    use super::DEFAULT_MAX_CONCURRENT;

    pub fn depth() -> i64 {
        4
    }

    pub fn max_concurrent() -> usize {
        DEFAULT_MAX_CONCURRENT
    }

    pub fn root_url() -> String {
        "https://golang.org/".to_string()
    }

    pub fn root_load_time() -> i64 {
        500
    }
}
