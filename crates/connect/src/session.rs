//! Session-scoped key/value storage
//!
//! Token records and in-flight authorization state are persisted for the
//! lifetime of one user session only. The trait abstracts the backing
//! store so embedders can bridge to whatever their host runtime offers
//! (webview session storage, an in-process map, a scoped file); the
//! in-memory implementation is the default and is what tests use.

use std::collections::HashMap;
use std::sync::RwLock;

/// String key/value store scoped to the current session.
///
/// Values vanish when the session ends; nothing here is durable and no
/// cross-session or cross-process sharing is guaranteed. Implementations
/// must be safe to share between tasks.
pub trait SessionStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any prior value.
    fn set(&self, key: &str, value: String);

    /// Remove the value stored under `key`. Removing an absent key is a
    /// no-op.
    fn remove(&self, key: &str);
}

/// In-memory session store.
///
/// Single-writer semantics are enforced by the callers (the flow
/// controller is the only writer); the lock here only guards against
/// torn reads across tasks.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.values.read() {
            Ok(guard) => guard.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    fn set(&self, key: &str, value: String) {
        match self.values.write() {
            Ok(mut guard) => {
                guard.insert(key.to_string(), value);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key.to_string(), value);
            }
        }
    }

    fn remove(&self, key: &str) {
        match self.values.write() {
            Ok(mut guard) => {
                guard.remove(key);
            }
            Err(poisoned) => {
                poisoned.into_inner().remove(key);
            }
        }
    }
}
