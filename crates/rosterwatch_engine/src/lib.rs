//! Rosterwatch engine: storage, watchlist persistence, remote lookups and
//! effect execution for the search debouncer.
mod aggregate;
mod engine;
mod notify;
mod persist;
mod source;
mod storage;
mod store;
mod sync;
mod types;
mod watchlist;

pub use aggregate::{
    CategorySource, LeadersCategory, NamesCategory, SearchAggregator, SearchSettings,
};
pub use engine::{SearchEvent, SearchHandle, SearchMode};
pub use notify::{ChannelNotifier, LogNotifier, Notifier};
pub use persist::{ensure_storage_dir, AtomicSlotFiles, PersistError};
pub use source::{ApiClient, ApiSettings, LeaderSource, NameSource, TradeSource};
pub use storage::{
    ContextId, ContextStorage, StorageArea, StorageError, StorageEvent, StorageSubscription,
};
pub use store::{decode_payload, encode_payload, PersistentStore, WATCHLIST_STORAGE_KEY};
pub use sync::CrossContextSync;
pub use types::{CategoryMap, FailureKind, LeaderEntry, SourceError};
pub use watchlist::{WatchlistEvent, WatchlistStore};
