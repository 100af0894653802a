use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use serde_json::{Value, json};

/// Key of the structured responses cache: the method name and its arguments.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CacheKey {
    pub method: String,
    pub args: Vec<Value>,
}

impl CacheKey {
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    /// Key for a `search` call over already serialized requests.
    #[must_use]
    pub fn search(requests: Vec<Value>) -> Self {
        Self::new("search", vec![Value::Array(requests)])
    }

    /// Canonical string form used for lookups.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        json!({ "method": self.method, "args": self.args }).to_string()
    }
}

/// Structured response cache keyed by `{ method, args }`.
pub trait ResponsesCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Value>;
    fn set(&self, key: &CacheKey, value: Value);
    fn clear(&self);
}

/// [`ResponsesCache`] kept in memory for the lifetime of the client.
#[derive(Debug, Default)]
pub struct InMemoryResponsesCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl InMemoryResponsesCache {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl ResponsesCache for InMemoryResponsesCache {
    fn get(&self, key: &CacheKey) -> Option<Value> {
        self.entries().get(&key.fingerprint()).cloned()
    }

    fn set(&self, key: &CacheKey, value: Value) {
        self.entries().insert(key.fingerprint(), value);
    }

    fn clear(&self) {
        self.entries().clear();
    }
}

/// Prefix of keys in the flat legacy cache.
pub const LEGACY_QUERIES_KEY_PREFIX: &str = "/1/indexes/*/queries_body_";

/// Flat string-keyed cache of serialized responses.
#[derive(Debug)]
pub struct LegacyCache {
    enabled: bool,
    entries: Mutex<HashMap<String, String>>,
}

impl LegacyCache {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Key under which the responses to `requests` are stored.
    #[must_use]
    pub fn queries_key(requests: &[Value]) -> String {
        format!(
            "{LEGACY_QUERIES_KEY_PREFIX}{}",
            json!({ "requests": requests })
        )
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    pub fn insert(&self, key: String, value: String) {
        self.entries().insert(key, value);
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl Default for LegacyCache {
    fn default() -> Self {
        Self::new(true)
    }
}
