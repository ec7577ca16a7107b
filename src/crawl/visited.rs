// src/crawl/visited.rs
// =============================================================================
// Tracks which pages have already been claimed during one crawl run.
//
// The only way to add a URL is mark_if_absent(), a test-and-set done under a
// single lock: when several branches race on the same URL, exactly one of
// them gets `true` and goes on to fetch the page.
//
// A fresh set is created for every run, so separate crawls never see each
// other's state.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` as visited.
    ///
    /// Returns `true` if this call added it, `false` if some earlier call
    /// already had.
    pub fn mark_if_absent(&self, url: &str) -> bool {
        let mut urls = self.lock();
        if urls.contains(url) {
            return false;
        }
        urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    /// Number of distinct URLs marked so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the set half-updated (each
    // critical section is a single insert or read), so a poisoned lock is
    // still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.urls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
