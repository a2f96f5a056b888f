//! Completion Barrier
//!
//! Counts outstanding units of work for one job or one pull run. Each unit holds a
//! `BarrierToken`; the unit is finished when its token is dropped, whether it delivered
//! a result, gave up, or its task unwound. `wait` returns once every token is gone.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct CompletionBarrier {
    outstanding: AtomicUsize,
    cleared: Notify,
}

impl CompletionBarrier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers one more unit of work.
    ///
    /// Enlist every unit before any of them can finish, otherwise `wait` may observe a
    /// transient zero and return early.
    pub fn enlist(self: &Arc<Self>) -> BarrierToken {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        BarrierToken {
            barrier: self.clone(),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Resolves when no tokens remain. Returns immediately if none were ever enlisted.
    pub async fn wait(&self) {
        loop {
            let notified = self.cleared.notified();
            tokio::pin!(notified);
            // Register interest before checking, so a release in between is not lost.
            notified.as_mut().enable();

            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn release(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.cleared.notify_waiters();
        }
    }
}

/// Proof that one unit of work is still outstanding.
#[derive(Debug)]
pub struct BarrierToken {
    barrier: Arc<CompletionBarrier>,
}

impl BarrierToken {
    /// Marks the unit finished. Same as dropping the token.
    pub fn complete(self) {}
}

impl Drop for BarrierToken {
    fn drop(&mut self) {
        self.barrier.release();
    }
}
