//! Run lock - one reclamation run at a time

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exclusive run lock shared by every Janitor that must not overlap
///
/// Injected rather than global: share one `Arc<RunLock>` between janitors
/// to serialize them, or give each its own. Acquisition never waits; a held
/// lock fails fast.
///
/// # Examples
///
/// ```
/// use reclaim_janitor::RunLock;
///
/// let lock = RunLock::shared();
/// let guard = lock.try_acquire().expect("free");
/// assert!(lock.try_acquire().is_none());
///
/// drop(guard);
/// assert!(lock.try_acquire().is_some());
/// ```
#[derive(Debug, Default)]
pub struct RunLock {
    held: AtomicBool,
}

impl RunLock {
    /// Create a lock ready to be shared
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Take the lock if it is free
    pub fn try_acquire(self: &Arc<Self>) -> Option<RunGuard> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                lock: Arc::clone(self),
            })
    }

    /// Whether a run currently holds the lock
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Proof of holding the run lock; releases it on drop
///
/// Dropping happens on every exit path of a run, including timeout and
/// early error returns.
#[derive(Debug)]
pub struct RunGuard {
    lock: Arc<RunLock>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.lock.held.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive() {
        let lock = RunLock::shared();
        let guard = lock.try_acquire();
        assert!(guard.is_some());
        assert!(lock.is_held());
        assert!(lock.try_acquire().is_none());
    }

    #[test]
    fn test_released_on_drop() {
        let lock = RunLock::shared();
        {
            let _guard = lock.try_acquire().unwrap();
        }
        assert!(!lock.is_held());
        assert!(lock.try_acquire().is_some());
    }

    #[test]
    fn test_released_on_panic() {
        let lock = RunLock::shared();
        let inner = Arc::clone(&lock);
        let result = std::thread::spawn(move || {
            let _guard = inner.try_acquire().unwrap();
            panic!("run blew up");
        })
        .join();

        assert!(result.is_err());
        assert!(!lock.is_held());
    }

    #[test]
    fn test_independent_locks() {
        let a = RunLock::shared();
        let b = RunLock::shared();
        let _ga = a.try_acquire().unwrap();
        assert!(b.try_acquire().is_some());
    }
}
