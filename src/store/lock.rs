//! In-process lock arena keyed by stored-file path.
//!
//! Two concurrent writers of the same credential or bundle would otherwise
//! race at the filesystem level. Each path gets its own mutex, created on
//! first use and dropped again once nobody holds or waits on it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct KeyLocks {
    slots: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// Not reentrant: calling `with` for the same key from inside `f`
    /// deadlocks.
    pub fn with<T>(&self, key: &Path, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.to_path_buf()).or_default())
        };

        let result = {
            // The guarded value is `()`, so a poisoned lock carries no torn state.
            let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here: nobody else is waiting.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(key);
        }

        result
    }

    /// Number of paths that currently have a live lock slot.
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn slots_are_released_after_use() {
        let locks = KeyLocks::new();
        locks.with(Path::new("/a"), || ());
        locks.with(Path::new("/b"), || ());
        assert_eq!(locks.active(), 0);
    }

    #[test]
    fn same_key_is_mutually_exclusive() {
        let locks = Arc::new(KeyLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    locks.with(Path::new("/same"), || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }
}
