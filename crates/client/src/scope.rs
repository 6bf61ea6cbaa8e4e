//! Discard async results that finish after their owner has gone.
//!
//! A view holds a [`MountGuard`] for as long as it is mounted and hands
//! [`MountScope`] clones to the fetches it starts. When the guard drops, any
//! fetch still in flight resolves to `None` instead of writing into state
//! nobody displays.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable view of a mount's liveness.
#[derive(Debug, Clone)]
pub struct MountScope {
    mounted: Arc<AtomicBool>,
}

impl MountScope {
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Await `fut` and keep its output only if still mounted.
    pub async fn settle<F: Future>(&self, fut: F) -> Option<F::Output> {
        let output = fut.await;
        if self.is_mounted() {
            Some(output)
        } else {
            tracing::debug!("Discarding result for unmounted view");
            None
        }
    }

    /// Run `apply` with `value` if still mounted. Returns whether it ran.
    pub fn apply<T>(&self, value: T, apply: impl FnOnce(T)) -> bool {
        if !self.is_mounted() {
            return false;
        }
        apply(value);
        true
    }
}

/// Marks a view as mounted until dropped.
#[derive(Debug)]
pub struct MountGuard {
    scope: MountScope,
}

impl MountGuard {
    #[must_use]
    pub fn mount() -> Self {
        Self {
            scope: MountScope {
                mounted: Arc::new(AtomicBool::new(true)),
            },
        }
    }

    #[must_use]
    pub fn scope(&self) -> MountScope {
        self.scope.clone()
    }
}

impl Default for MountGuard {
    fn default() -> Self {
        Self::mount()
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        self.scope.mounted.store(false, Ordering::Release);
    }
}
