use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};

/// Key-value persistence backend for the stores.
///
/// Values are opaque strings (the stores write JSON). Every write replaces the
/// previous value for the key in full.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, overwriting any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove_item(&self, key: &str) -> Result<()>;

    /// List all keys currently stored
    fn keys(&self) -> Result<Vec<String>>;

    /// Check whether the backend is usable
    fn health_check(&self) -> Result<HealthStatus> {
        Ok(HealthStatus::Healthy)
    }
}

pub type SharedStorage = Arc<dyn Storage>;

/// Health status of a storage backend
#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Warning(String),
    Unavailable(String),
}

/// Configuration for the in-memory backend
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Maximum total size of keys and values, in bytes
    pub quota_bytes: Option<usize>,
}

/// Memory-only storage, the equivalent of a fresh browser profile.
///
/// Clones share the same underlying map, so a "reload" in tests is simply a
/// new store built on a clone of the same storage.
#[derive(Clone)]
pub struct MemoryStorage {
    items: Arc<RwLock<HashMap<String, String>>>,
    config: StorageConfig,
}

impl MemoryStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self::new(StorageConfig {
            quota_bytes: Some(quota_bytes),
        })
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Total bytes used by keys and values
    pub fn used_bytes(&self) -> usize {
        self.items
            .read()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new(StorageConfig::default())
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.write();

        if let Some(quota) = self.config.quota_bytes {
            let current: usize = items.iter().map(|(k, v)| k.len() + v.len()).sum();
            let replaced = items.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
            let needed = current - replaced + key.len() + value.len();
            if needed > quota {
                return Err(Error::QuotaExceeded(format!(
                    "writing '{}' needs {} bytes, quota is {}",
                    key, needed, quota
                )));
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.items.read().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn health_check(&self) -> Result<HealthStatus> {
        match self.config.quota_bytes {
            Some(quota) if self.used_bytes() * 10 >= quota * 9 => Ok(HealthStatus::Warning(
                format!("{} of {} bytes used", self.used_bytes(), quota),
            )),
            _ => Ok(HealthStatus::Healthy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_basic_operations() {
        let storage = MemoryStorage::default();

        assert!(storage.get_item("articles").unwrap().is_none());

        storage.set_item("articles", "[]").unwrap();
        assert_eq!(storage.get_item("articles").unwrap().as_deref(), Some("[]"));

        storage.set_item("articles", "[1]").unwrap();
        assert_eq!(storage.get_item("articles").unwrap().as_deref(), Some("[1]"));
        assert_eq!(storage.len(), 1);

        storage.remove_item("articles").unwrap();
        assert!(storage.is_empty());

        // Removing twice is fine
        storage.remove_item("articles").unwrap();
    }

    #[test]
    fn test_memory_storage_clones_share_state() {
        let storage = MemoryStorage::default();
        let other = storage.clone();

        storage.set_item("darkMode", "true").unwrap();
        assert_eq!(other.get_item("darkMode").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_memory_storage_quota() {
        let storage = MemoryStorage::with_quota(20);

        storage.set_item("k", "0123456789").unwrap();
        let err = storage.set_item("other", "0123456789").unwrap_err();
        assert_eq!(err.error_code(), "QUOTA_EXCEEDED");

        // Overwriting an existing key only counts the difference
        storage.set_item("k", "01234567890123").unwrap();
        assert_eq!(storage.get_item("other").unwrap(), None);
    }

    #[test]
    fn test_memory_storage_keys_sorted() {
        let storage = MemoryStorage::default();
        storage.set_item("comments", "[]").unwrap();
        storage.set_item("articles", "[]").unwrap();

        assert_eq!(storage.keys().unwrap(), vec!["articles", "comments"]);
    }

    #[test]
    fn test_health_warning_near_quota() {
        let storage = MemoryStorage::with_quota(10);
        assert_eq!(storage.health_check().unwrap(), HealthStatus::Healthy);

        storage.set_item("k", "123456789").unwrap();
        assert!(matches!(storage.health_check().unwrap(), HealthStatus::Warning(_)));
    }
}
