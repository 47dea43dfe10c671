use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value as JsonValue;

use entrust_auth::{CacheBackend, CacheScope};
use entrust_core::CacheError;

/// Plain key/value store without scoped invalidation.
///
/// `RbacCache` never writes to a backend like this; every decision reads the
/// repository directly.
#[derive(Debug, Default)]
pub struct UntaggedCache {
    entries: Mutex<HashMap<String, JsonValue>>,
}

impl UntaggedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        self.entries
            .lock()
            .map(|entries| entries.is_empty())
            .map_err(|_| CacheError::Backend("lock poisoned".to_string()))
    }
}

impl CacheBackend for UntaggedCache {
    fn supports_tagging(&self) -> bool {
        false
    }

    fn generation(&self, _scope: &CacheScope) -> Result<u64, CacheError> {
        Ok(0)
    }

    fn get(&self, _scope: &CacheScope, key: &str) -> Result<Option<JsonValue>, CacheError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Backend("lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(
        &self,
        _scope: &CacheScope,
        key: &str,
        value: JsonValue,
        _ttl: Duration,
        _generation: u64,
    ) -> Result<bool, CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Backend("lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(true)
    }

    fn flush_scope(&self, scope: &CacheScope) -> Result<(), CacheError> {
        Err(CacheError::Backend(format!("cannot flush '{scope}': store has no tag support")))
    }
}
