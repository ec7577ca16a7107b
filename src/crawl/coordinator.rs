// src/crawl/coordinator.rs
// =============================================================================
// Knows when a concurrent crawl is finished.
//
// Each spawned branch is registered before it is dispatched and deregistered
// when it returns. A parent registers all of its children before it
// deregisters itself, so the count can only reach zero once no branch is
// left anywhere in the tree.
//
// Deregistering goes through BranchGuard, which does it on drop. That covers
// every way a branch can end: the depth check, the visited check, the normal
// path, and even a panic inside the task.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct CompletionCoordinator {
    outstanding: AtomicUsize,
    all_done: Notify,
}

impl CompletionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one more branch about to be dispatched.
    pub fn register(&self) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
    }

    /// Records that a branch finished. Wakes waiters when none are left.
    pub fn deregister(&self) {
        let previous = self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));

        match previous {
            Ok(1) => self.all_done.notify_waiters(),
            Ok(_) => {}
            Err(_) => log::error!("deregister called with no outstanding branches"),
        }
    }

    /// Registers a branch and returns a guard that deregisters it on drop.
    pub fn register_branch(self: &Arc<Self>) -> BranchGuard {
        self.register();
        BranchGuard { coordinator: Arc::clone(self) }
    }

    /// Branches registered but not yet finished.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Waits until every registered branch has finished.
    ///
    /// Returns immediately when nothing is outstanding.
    pub async fn await_all_complete(&self) {
        loop {
            // Created before the check so a wakeup between the check and the
            // await is not lost.
            let notified = self.all_done.notified();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Holds one registration; dropping it deregisters the branch.
#[derive(Debug)]
pub struct BranchGuard {
    coordinator: Arc<CompletionCoordinator>,
}

impl Drop for BranchGuard {
    fn drop(&mut self) {
        self.coordinator.deregister();
    }
}
