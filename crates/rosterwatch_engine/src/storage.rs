//! Key-value storage shared by several browsing contexts.
//!
//! A [`StorageArea`] plays the role of the browser's local storage: every
//! context opened on it sees the same slots, and a change made by one
//! context is announced to subscribers in the *other* contexts only. When
//! created with a directory, each slot is mirrored to `{dir}/{key}.json`
//! so values survive restarts, and the directory is watched so writes made
//! by another process reach subscribers as external changes.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError, Weak};

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rosterwatch_logging::{rw_debug, rw_trace, rw_warn};
use thiserror::Error;

use crate::persist::{ensure_storage_dir, AtomicSlotFiles, PersistError};

pub type ContextId = u64;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is disabled")]
    Disabled,
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: u64, quota: u64 },
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// A slot changed in another context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

struct Listener {
    id: u64,
    context: ContextId,
    key: String,
    tx: mpsc::Sender<StorageEvent>,
}

struct AreaInner {
    slots: HashMap<String, String>,
    loaded: HashSet<String>,
    files: Option<AtomicSlotFiles>,
    quota: Option<u64>,
    enabled: bool,
    listeners: Vec<Listener>,
    next_context: ContextId,
    next_listener: u64,
    writes: u64,
}

impl AreaInner {
    fn new(files: Option<AtomicSlotFiles>) -> Self {
        Self {
            slots: HashMap::new(),
            loaded: HashSet::new(),
            files,
            quota: None,
            enabled: true,
            listeners: Vec::new(),
            next_context: 1,
            next_listener: 1,
            writes: 0,
        }
    }

    fn check_access(&self, key: &str) -> Result<(), StorageError> {
        if !self.enabled {
            return Err(StorageError::Disabled);
        }
        if !is_valid_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(())
    }

    /// Current on-disk content of a slot. An unreadable file counts as
    /// absent so the next write can replace it.
    fn read_file(&self, key: &str) -> Option<String> {
        let files = self.files.as_ref()?;
        match files.read(key) {
            Ok(text) => text,
            Err(err) => {
                rw_warn!("Treating unreadable slot file for {} as empty: {}", key, err);
                None
            }
        }
    }

    /// Brings the cached slot in line with disk: loads it the first time it
    /// is touched, and afterwards picks up writes made by other processes.
    fn refresh(&mut self, key: &str) {
        if self.files.is_none() {
            return;
        }
        let on_disk = self.read_file(key);
        if self.loaded.insert(key.to_string()) {
            if let Some(text) = on_disk {
                self.slots.insert(key.to_string(), text);
            }
            return;
        }
        if self.slots.get(key) == on_disk.as_ref() {
            return;
        }
        let old_value = match &on_disk {
            Some(text) => self.slots.insert(key.to_string(), text.clone()),
            None => self.slots.remove(key),
        };
        rw_debug!("{} was changed on disk by another process", key);
        self.announce(
            None,
            StorageEvent {
                key: key.to_string(),
                old_value,
                new_value: on_disk,
            },
        );
    }

    fn used_bytes_without(&self, key: &str) -> u64 {
        self.slots
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(existing, value)| (existing.len() + value.len()) as u64)
            .sum()
    }

    /// Delivers `event` to every listener on its key except those of the
    /// originating context. `None` marks a change from outside the process.
    fn announce(&mut self, origin: Option<ContextId>, event: StorageEvent) {
        self.listeners.retain(|listener| {
            if Some(listener.context) == origin || listener.key != event.key {
                return true;
            }
            listener.tx.send(event.clone()).is_ok()
        });
    }
}

/// Storage shared by every context opened on it. Cloning shares the area.
#[derive(Clone)]
pub struct StorageArea {
    inner: Arc<Mutex<AreaInner>>,
    _watcher: Option<Arc<Mutex<RecommendedWatcher>>>,
}

impl StorageArea {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(AreaInner::new(None))),
            _watcher: None,
        }
    }

    /// Storage mirrored to one JSON file per key under `dir`.
    ///
    /// Several areas (or processes) may share a directory. Their writes are
    /// noticed by the file watcher, and in any case on the next access to
    /// the slot or the next [`StorageSubscription::drain`].
    pub fn with_directory(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let inner = Arc::new(Mutex::new(AreaInner::new(Some(AtomicSlotFiles::new(
            dir.clone(),
        )))));
        let watcher = watch_directory(&dir, Arc::downgrade(&inner));
        Self {
            inner,
            _watcher: watcher.map(|watcher| Arc::new(Mutex::new(watcher))),
        }
    }

    pub fn open_context(&self) -> ContextStorage {
        let id = {
            let mut inner = self.lock();
            let id = inner.next_context;
            inner.next_context += 1;
            id
        };
        rw_debug!("Opened storage context {}", id);
        ContextStorage {
            id,
            area: self.clone(),
        }
    }

    /// Limits total stored bytes (keys plus values). `None` removes the limit.
    pub fn set_quota(&self, quota: Option<u64>) {
        self.lock().quota = quota;
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    /// Number of live subscriptions across all contexts.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Number of successful `set` calls since creation.
    pub fn write_count(&self) -> u64 {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, AreaInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut inner = self.lock();
        inner.check_access(key)?;
        inner.refresh(key);
        Ok(inner.slots.get(key).cloned())
    }

    fn set(&self, origin: ContextId, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.check_access(key)?;
        inner.refresh(key);

        if let Some(quota) = inner.quota {
            let needed = inner.used_bytes_without(key) + (key.len() + value.len()) as u64;
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        if let Some(files) = &inner.files {
            files.write(key, value)?;
        }

        let old_value = inner.slots.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        rw_trace!("Context {} wrote {} bytes to {}", origin, value.len(), key);

        if old_value.as_deref() != Some(value) {
            inner.announce(
                Some(origin),
                StorageEvent {
                    key: key.to_string(),
                    old_value,
                    new_value: Some(value.to_string()),
                },
            );
        }
        Ok(())
    }

    fn remove(&self, origin: ContextId, key: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.check_access(key)?;
        inner.refresh(key);
        if let Some(files) = &inner.files {
            files.remove(key)?;
        }
        if let Some(old_value) = inner.slots.remove(key) {
            inner.announce(
                Some(origin),
                StorageEvent {
                    key: key.to_string(),
                    old_value: Some(old_value),
                    new_value: None,
                },
            );
        }
        Ok(())
    }

    fn subscribe(&self, context: ContextId, key: &str) -> StorageSubscription {
        let (tx, rx) = mpsc::channel();
        let mut inner = self.lock();
        let id = inner.next_listener;
        inner.next_listener += 1;
        inner.listeners.push(Listener {
            id,
            context,
            key: key.to_string(),
            tx,
        });
        StorageSubscription {
            id,
            key: key.to_string(),
            area: Arc::downgrade(&self.inner),
            rx,
        }
    }
}

/// Watches `dir` for slot files replaced by other processes.
fn watch_directory(dir: &Path, area: Weak<Mutex<AreaInner>>) -> Option<RecommendedWatcher> {
    if let Err(err) = ensure_storage_dir(dir) {
        rw_warn!("Not watching {:?}: {}", dir, err);
        return None;
    }
    let handler = move |result: notify::Result<notify::Event>| {
        let event = match result {
            Ok(event) => event,
            Err(err) => {
                rw_warn!("Storage watcher error: {}", err);
                return;
            }
        };
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) {
            return;
        }
        let Some(shared) = area.upgrade() else {
            return;
        };
        let mut inner = shared.lock().unwrap_or_else(PoisonError::into_inner);
        for key in event.paths.iter().filter_map(|path| slot_key(path)) {
            if inner.loaded.contains(&key) {
                inner.refresh(&key);
            }
        }
    };

    let mut watcher = match RecommendedWatcher::new(handler, Config::default()) {
        Ok(watcher) => watcher,
        Err(err) => {
            rw_warn!("Could not create storage watcher for {:?}: {}", dir, err);
            return None;
        }
    };
    if let Err(err) = watcher.watch(dir, RecursiveMode::NonRecursive) {
        rw_warn!("Could not watch {:?}: {}", dir, err);
        return None;
    }
    rw_debug!("Watching {:?} for external slot changes", dir);
    Some(watcher)
}

/// `{dir}/{key}.json` back to `key`. Temp files and foreign files yield `None`.
fn slot_key(path: &Path) -> Option<String> {
    if path.extension()? != "json" {
        return None;
    }
    let key = path.file_stem()?.to_str()?;
    is_valid_key(key).then(|| key.to_string())
}

/// One browsing context's view of a [`StorageArea`].
#[derive(Clone)]
pub struct ContextStorage {
    id: ContextId,
    area: StorageArea,
}

impl ContextStorage {
    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn area(&self) -> &StorageArea {
        &self.area
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.area.get(key)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.area.set(self.id, key, value)
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.area.remove(self.id, key)
    }

    /// Changes to `key` made by other contexts. Own writes are not delivered.
    pub fn subscribe(&self, key: &str) -> StorageSubscription {
        self.area.subscribe(self.id, key)
    }
}

/// Live registration for storage events; unregisters on drop.
pub struct StorageSubscription {
    id: u64,
    key: String,
    area: Weak<Mutex<AreaInner>>,
    rx: mpsc::Receiver<StorageEvent>,
}

impl StorageSubscription {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn try_recv(&self) -> Option<StorageEvent> {
        self.rx.try_recv().ok()
    }

    /// Everything received since the last call. A directory-backed area
    /// first checks the slot file, so writes from other processes show up
    /// here even before the watcher reports them.
    pub fn drain(&self) -> Vec<StorageEvent> {
        if let Some(shared) = self.area.upgrade() {
            let mut inner = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if inner.loaded.contains(&self.key) {
                inner.refresh(&self.key);
            }
        }
        self.rx.try_iter().collect()
    }
}

impl Drop for StorageSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.area.upgrade() {
            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.listeners.retain(|listener| listener.id != self.id);
        }
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !key.starts_with('.')
}
