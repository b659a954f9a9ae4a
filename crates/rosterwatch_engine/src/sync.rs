use rosterwatch_logging::rw_debug;

use crate::storage::{ContextStorage, StorageSubscription};

/// Watches one storage slot for changes made by other contexts, including
/// other processes sharing a storage directory.
///
/// The subscription lives exactly as long as this value.
pub struct CrossContextSync {
    subscription: StorageSubscription,
}

impl CrossContextSync {
    pub fn attach(storage: &ContextStorage, key: &str) -> Self {
        Self {
            subscription: storage.subscribe(key),
        }
    }

    /// Drains pending notifications. Returns whether the slot changed
    /// elsewhere since the last poll; callers then re-read the slot.
    pub fn poll(&self) -> bool {
        let events = self.subscription.drain();
        if events.is_empty() {
            return false;
        }
        rw_debug!("{} changed in another context ({} notifications)", self.subscription.key(), events.len());
        true
    }
}
