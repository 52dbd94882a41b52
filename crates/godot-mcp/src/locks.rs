//! Per-file serialization of tool calls.
//!
//! Two patches computed from the same pre-image would overwrite each other, so
//! every read-modify-write of a path runs under that path's lock. Calls on
//! different paths do not wait on each other.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub struct FileLocks {
    inner: Arc<Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>>,
}

impl FileLocks {
    /// Waits for exclusive access to `path`.
    pub async fn lock(&self, path: &Path) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or waits on can go.
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(map.entry(path.to_path_buf()).or_default())
        };
        entry.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_path_is_exclusive() {
        let locks = FileLocks::default();
        let path = Path::new("player.gd");

        let guard = locks.lock(path).await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(Path::new("player.gd")).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should acquire after release")
            .unwrap();
    }

    #[tokio::test]
    async fn different_paths_do_not_block() {
        let locks = FileLocks::default();
        let _a = locks.lock(Path::new("a.gd")).await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.lock(Path::new("b.gd"))).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = FileLocks::default();
        drop(locks.lock(Path::new("a.gd")).await);
        drop(locks.lock(Path::new("b.gd")).await);
        assert_eq!(locks.tracked(), 1);
    }
}
