use rosterwatch_logging::{rw_error, rw_warn};
use serde_json::Value;

use crate::storage::ContextStorage;

/// Storage key for the watchlist payload. Bump the suffix on incompatible
/// schema changes so old and new payloads can coexist.
pub const WATCHLIST_STORAGE_KEY: &str = "watchlist_v1";

/// Parses a persisted payload. Anything other than a JSON array yields an
/// empty list; non-string array elements are skipped.
pub fn decode_payload(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(name),
                _ => None,
            })
            .collect(),
        Ok(other) => {
            rw_warn!("Ignoring persisted payload that is not an array: {}", json_kind(&other));
            Vec::new()
        }
        Err(err) => {
            rw_warn!("Ignoring unparsable persisted payload: {}", err);
            Vec::new()
        }
    }
}

pub fn encode_payload(names: &[String]) -> Result<String, serde_json::Error> {
    serde_json::to_string(names)
}

/// Durable copy of a list of names in one storage slot.
///
/// Never fails: reads degrade to an empty list and write failures are
/// logged and dropped, leaving the in-memory owner authoritative.
#[derive(Clone)]
pub struct PersistentStore {
    storage: ContextStorage,
    key: String,
}

impl PersistentStore {
    pub fn new(storage: ContextStorage, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &ContextStorage {
        &self.storage
    }

    pub fn read(&self) -> Vec<String> {
        match self.storage.get(&self.key) {
            Ok(Some(raw)) => decode_payload(&raw),
            Ok(None) => Vec::new(),
            Err(err) => {
                rw_warn!("Failed to read {}: {}", self.key, err);
                Vec::new()
            }
        }
    }

    pub fn write(&self, names: &[String]) {
        let payload = match encode_payload(names) {
            Ok(payload) => payload,
            Err(err) => {
                rw_error!("Failed to serialize {}: {}", self.key, err);
                return;
            }
        };
        if let Err(err) = self.storage.set(&self.key, &payload) {
            rw_error!("Failed to persist {} ({} names): {}", self.key, names.len(), err);
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
