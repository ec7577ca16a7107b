// src/crawl/page.rs
// =============================================================================
// A page is the unit the crawler visits: a URL plus how long it takes to
// "load". There is no real network here, so the load time is slept instead.
//
// Pages are immutable once built. The only validation is that the load time
// is not negative.
// =============================================================================

use std::time::Duration;

use serde::Serialize;

use crate::error::{CrawlError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Page {
    url: String,
    load_time_ms: u64,
}

impl Page {
    /// Builds a page, rejecting a negative load time.
    ///
    /// The load time is taken as a signed integer so that bad input coming
    /// from config files or callers is reported instead of wrapping around.
    pub fn new(url: impl Into<String>, load_time_ms: i64) -> Result<Self> {
        let url = url.into();
        let load_time_ms = u64::try_from(load_time_ms)
            .map_err(|_| CrawlError::InvalidLoadCost { url: url.clone(), load_time_ms })?;

        Ok(Self { url, load_time_ms })
    }

    /// Builds a page from an unsigned load time, which cannot be invalid.
    pub fn from_millis(url: impl Into<String>, load_time_ms: u64) -> Self {
        Self { url: url.into(), load_time_ms }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn load_time_ms(&self) -> u64 {
        self.load_time_ms
    }

    /// The simulated fetch latency
    pub fn load_time(&self) -> Duration {
        Duration::from_millis(self.load_time_ms)
    }
}
