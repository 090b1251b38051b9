//! Auth token persistence with explicit expiry
//!
//! Tokens live in an injected key-value store rather than ambient global
//! state. Every read checks the expiry timestamp; an expired entry is
//! removed and reported as absent.

use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Storage key used for the access token
pub const TOKEN_KEY: &str = "kino_live_auth_token";

/// Minimal string key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store, shareable across clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Access token store backed by a [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct TokenStore<S> {
    store: S,
}

impl<S: KeyValueStore> TokenStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persist a token valid for `ttl` from now
    pub fn save(&self, token: &str, ttl: Duration) -> Result<()> {
        self.save_until(token, Utc::now() + ttl)
    }

    pub fn save_until(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let stored = StoredToken {
            token: token.to_string(),
            expires_at,
        };
        self.store.set(TOKEN_KEY, &serde_json::to_string(&stored)?)
    }

    /// Current token, if present and unexpired
    pub fn token(&self) -> Result<Option<String>> {
        self.token_at(Utc::now())
    }

    /// Token lookup against an explicit clock
    pub fn token_at(&self, now: DateTime<Utc>) -> Result<Option<String>> {
        let Some(raw) = self.store.get(TOKEN_KEY)? else {
            return Ok(None);
        };

        let stored: StoredToken = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                debug!(error = %e, "Discarding unreadable stored token");
                self.store.remove(TOKEN_KEY)?;
                return Ok(None);
            }
        };

        if stored.expires_at <= now {
            debug!(expired_at = %stored.expires_at, "Stored token expired");
            self.store.remove(TOKEN_KEY)?;
            return Ok(None);
        }

        Ok(Some(stored.token))
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let tokens = TokenStore::new(MemoryStore::new());
        tokens.save("abc", Duration::hours(1)).unwrap();
        assert_eq!(tokens.token().unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_expired_token_removed() {
        let store = MemoryStore::new();
        let tokens = TokenStore::new(store.clone());
        let now = Utc::now();
        tokens.save_until("abc", now).unwrap();

        assert_eq!(tokens.token_at(now).unwrap(), None);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_corrupt_entry_discarded() {
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "not json").unwrap();
        let tokens = TokenStore::new(store.clone());

        assert_eq!(tokens.token().unwrap(), None);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_clear() {
        let tokens = TokenStore::new(MemoryStore::new());
        tokens.save("abc", Duration::minutes(5)).unwrap();
        tokens.clear().unwrap();
        assert_eq!(tokens.token().unwrap(), None);
    }
}
