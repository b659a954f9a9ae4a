use std::sync::{mpsc, Arc};

use rosterwatch_core::{ExclusionSet, Watchlist};
use rosterwatch_logging::{rw_debug, rw_info};

use crate::notify::Notifier;
use crate::storage::ContextStorage;
use crate::store::{PersistentStore, WATCHLIST_STORAGE_KEY};
use crate::sync::CrossContextSync;

/// Change published to watchlist observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchlistEvent {
    Added(String),
    Removed(String),
    Cleared,
    /// The list was replaced by a newer copy written in another context.
    Replaced(Vec<String>),
}

/// The one owner of a context's watchlist.
///
/// Every mutation first applies pending external changes, then writes the
/// result through to the persistent slot before the call returns, so a
/// fresh read of the slot reconstructs the in-memory list.
/// Dropping the store releases its cross-context subscription.
pub struct WatchlistStore {
    list: Watchlist,
    store: PersistentStore,
    sync: CrossContextSync,
    notifier: Arc<dyn Notifier>,
    observers: Vec<mpsc::Sender<WatchlistEvent>>,
}

impl WatchlistStore {
    pub fn open(storage: ContextStorage, notifier: Arc<dyn Notifier>) -> Self {
        Self::open_with_key(storage, WATCHLIST_STORAGE_KEY, notifier)
    }

    pub fn open_with_key(storage: ContextStorage, key: &str, notifier: Arc<dyn Notifier>) -> Self {
        // Subscribe before the first read so no external write slips between them.
        let sync = CrossContextSync::attach(&storage, key);
        let store = PersistentStore::new(storage, key);
        let list = Watchlist::from_names(store.read());
        rw_info!(
            "Loaded {} watched names from {} in context {}",
            list.len(),
            key,
            store.storage().id()
        );
        Self {
            list,
            store,
            sync,
            notifier,
            observers: Vec::new(),
        }
    }

    pub fn names(&self) -> &[String] {
        self.list.names()
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.list.contains(name)
    }

    pub fn exclusion_set(&self) -> ExclusionSet {
        self.list.exclusion_set()
    }

    /// Prepends `name` unless blank or already watched. Returns whether it was added.
    pub fn add(&mut self, name: &str) -> bool {
        self.sync_external();
        let Some(stored) = self.list.add(name) else {
            return false;
        };
        self.persist();
        self.notifier.notify(&format!("Added {stored} to Watchlist"));
        self.publish(WatchlistEvent::Added(stored));
        true
    }

    /// Removes the case-insensitive match for `name`. Returns whether one was removed.
    ///
    /// Non-blank input always writes the resulting list, matched or not.
    pub fn remove(&mut self, name: &str) -> bool {
        self.sync_external();
        if name.trim().is_empty() {
            return false;
        }
        let removed = self.list.remove(name);
        self.persist();
        match removed {
            Some(stored) => {
                self.notifier.notify(&format!("Removed {stored} from Watchlist"));
                self.publish(WatchlistEvent::Removed(stored));
                true
            }
            None => false,
        }
    }

    /// Removes `name` if watched (returning `false`), otherwise adds it
    /// (returning `true`). Writes the slot once; blank input writes nothing.
    pub fn toggle(&mut self, name: &str) -> bool {
        self.sync_external();
        if self.contains(name) {
            self.remove(name);
            false
        } else {
            self.add(name)
        }
    }

    /// Empties the list and writes `[]`, even when already empty.
    pub fn clear(&mut self) {
        self.sync_external();
        self.list.clear();
        self.persist();
        self.notifier.notify("Cleared Watchlist");
        self.publish(WatchlistEvent::Cleared);
    }

    /// Observers get every later change, in order.
    pub fn subscribe(&mut self) -> mpsc::Receiver<WatchlistEvent> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    /// Applies changes written by other contexts: the persisted copy replaces
    /// the in-memory list. Returns whether a notification was pending.
    pub fn sync_external(&mut self) -> bool {
        if !self.sync.poll() {
            return false;
        }
        let reloaded = Watchlist::from_names(self.store.read());
        if reloaded != self.list {
            rw_debug!(
                "Replacing {} watched names with {} from another context",
                self.list.len(),
                reloaded.len()
            );
            self.list = reloaded;
            let names = self.list.names().to_vec();
            self.publish(WatchlistEvent::Replaced(names));
        }
        true
    }

    fn persist(&self) {
        self.store.write(self.list.names());
    }

    fn publish(&mut self, event: WatchlistEvent) {
        self.observers
            .retain(|observer| observer.send(event.clone()).is_ok());
    }
}
