use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{ Mutex, OwnedMutexGuard, RwLock };
use uuid::Uuid;

/// One async mutex per tracked item.
///
/// Whoever mutates an item's detection state holds its guard for the whole
/// read-evaluate-write sequence, so overlapping polls cannot both fire.
#[derive(Clone, Default)]
pub struct ItemLocks {
    inner: Arc<RwLock<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl ItemLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, item_id: Uuid) -> OwnedMutexGuard<()> {
        let existing = {
            let locks = self.inner.read().await;
            locks.get(&item_id).cloned()
        };

        let lock = match existing {
            Some(lock) => lock,
            None => {
                let mut locks = self.inner.write().await;
                locks.entry(item_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
            }
        };

        lock.lock_owned().await
    }

    /// Drop the lock entry of a deleted item.
    pub async fn forget(&self, item_id: Uuid) {
        self.inner.write().await.remove(&item_id);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
