use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-user async mutexes. Holding the guard serializes ledger writes for one
/// user; different users never contend.
#[derive(Default)]
pub struct UserLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the shard lock is released before awaiting.
        let lock = self
            .locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drops entries nobody holds or waits on. Returns how many remain.
    pub fn prune(&self) -> usize {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        self.locks.len()
    }
}
