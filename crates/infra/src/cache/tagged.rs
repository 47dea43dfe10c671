use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;
use serde_json::Value as JsonValue;

use entrust_auth::{CacheBackend, CacheScope};
use entrust_core::CacheError;

/// Default bound on entries held per scope.
pub const DEFAULT_MAX_ENTRIES_PER_SCOPE: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    value: JsonValue,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with.
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// One scope: a bounded moka cache plus its flush generation.
struct Scope {
    generation: u64,
    entries: Cache<String, Entry>,
}

impl Scope {
    fn new(max_entries: u64) -> Self {
        Self {
            generation: 0,
            entries: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(EntryTtl)
                .build(),
        }
    }
}

/// Process-local cache with per-scope flushing, per-entry TTL and a bound on
/// entries per scope.
///
/// `set` holds the scope map's read lock while it checks the generation and
/// inserts; `flush_scope` takes the write lock to advance the generation and
/// swap in an empty cache. A flush therefore never interleaves with a store,
/// and a load started before the flush is refused.
pub struct InMemoryTaggedCache {
    scopes: RwLock<HashMap<CacheScope, Scope>>,
    max_entries: u64,
}

impl Default for InMemoryTaggedCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES_PER_SCOPE)
    }
}

impl InMemoryTaggedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries_per_scope: u64) -> Self {
        Self {
            scopes: RwLock::new(HashMap::new()),
            max_entries: max_entries_per_scope,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<CacheScope, Scope>>, CacheError> {
        self.scopes
            .read()
            .map_err(|_| CacheError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<CacheScope, Scope>>, CacheError> {
        self.scopes
            .write()
            .map_err(|_| CacheError::Backend("lock poisoned".to_string()))
    }

    /// Live (unexpired, not invalidated) entries under `scope`.
    pub fn len(&self, scope: &CacheScope) -> Result<usize, CacheError> {
        let scopes = self.read()?;
        Ok(scopes
            .get(scope)
            .map(|s| {
                s.entries
                    .iter()
                    .filter(|(key, _)| s.entries.get(key.as_str()).is_some())
                    .count()
            })
            .unwrap_or(0))
    }
}

impl CacheBackend for InMemoryTaggedCache {
    fn supports_tagging(&self) -> bool {
        true
    }

    fn generation(&self, scope: &CacheScope) -> Result<u64, CacheError> {
        let scopes = self.read()?;
        Ok(scopes.get(scope).map(|s| s.generation).unwrap_or(0))
    }

    fn get(&self, scope: &CacheScope, key: &str) -> Result<Option<JsonValue>, CacheError> {
        let scopes = self.read()?;
        Ok(scopes
            .get(scope)
            .and_then(|s| s.entries.get(key))
            .map(|entry| entry.value))
    }

    fn set(
        &self,
        scope: &CacheScope,
        key: &str,
        value: JsonValue,
        ttl: Duration,
        generation: u64,
    ) -> Result<bool, CacheError> {
        let entry = Entry { value, ttl };
        {
            let scopes = self.read()?;
            if let Some(s) = scopes.get(scope) {
                if s.generation != generation {
                    return Ok(false);
                }
                s.entries.insert(key.to_string(), entry);
                return Ok(true);
            }
        }

        // First store in this scope.
        let mut scopes = self.write()?;
        let s = scopes
            .entry(scope.clone())
            .or_insert_with(|| Scope::new(self.max_entries));
        if s.generation != generation {
            return Ok(false);
        }
        s.entries.insert(key.to_string(), entry);
        Ok(true)
    }

    fn flush_scope(&self, scope: &CacheScope) -> Result<(), CacheError> {
        let mut scopes = self.write()?;
        let s = scopes
            .entry(scope.clone())
            .or_insert_with(|| Scope::new(self.max_entries));
        // A fresh cache rather than `invalidate_all`: the old entries are
        // released now, not on the next maintenance pass.
        *s = Scope {
            generation: s.generation + 1,
            ..Scope::new(self.max_entries)
        };
        Ok(())
    }
}
