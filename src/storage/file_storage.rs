use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::storage::traits::{HealthStatus, Storage};

const FILE_EXTENSION: &str = "json";

/// Configuration for the file-backed storage
#[derive(Debug, Clone)]
pub struct FileStorageConfig {
    pub data_dir: PathBuf,
    pub max_size_mb: u64,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("cara-store"),
            max_size_mb: 5, // same order as a browser's local storage budget
        }
    }
}

/// Storage that keeps one file per key inside a data directory.
///
/// Each write goes to a temporary file in the same directory which is then
/// renamed over the target, so a crash never leaves a half-written value.
pub struct FileStorage {
    config: FileStorageConfig,
}

impl FileStorage {
    pub fn new(config: FileStorageConfig) -> Result<Self> {
        if !config.data_dir.exists() {
            fs::create_dir_all(&config.data_dir).map_err(|e| {
                Error::Storage(format!(
                    "Failed to create data directory '{}': {}",
                    config.data_dir.display(),
                    e
                ))
            })?;
        }

        Ok(Self { config })
    }

    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        Self::new(FileStorageConfig {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Default::default()
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::Invalid(format!("Unsupported storage key '{}'", key)));
        }

        Ok(self
            .config
            .data_dir
            .join(format!("{}.{}", key, FILE_EXTENSION)))
    }

    /// Total size of stored values on disk
    pub fn size_bytes(&self) -> u64 {
        fs::read_dir(&self.config.data_dir)
            .map(|entries| {
                entries
                    .flatten()
                    .filter_map(|entry| entry.metadata().ok())
                    .filter(|meta| meta.is_file())
                    .map(|meta| meta.len())
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Remove leftover temporary files from interrupted writes
    pub fn cleanup(&self) -> Result<usize> {
        let mut removed = 0;
        if let Ok(entries) = fs::read_dir(&self.config.data_dir) {
            for entry in entries.flatten() {
                if let Some(name) = entry.file_name().to_str() {
                    if name.starts_with(".tmp") && fs::remove_file(entry.path()).is_ok() {
                        removed += 1;
                    }
                }
            }
        }
        Ok(removed)
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            tracing::debug!("No stored value for '{}'", key);
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            Error::Storage(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Ok(Some(content))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;

        let max_bytes = self.config.max_size_mb * 1024 * 1024;
        let existing = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let needed = self.size_bytes().saturating_sub(existing) + value.len() as u64;
        if needed > max_bytes {
            return Err(Error::QuotaExceeded(format!(
                "writing '{}' needs {} bytes, limit is {} MB",
                key, needed, self.config.max_size_mb
            )));
        }

        let mut temp = tempfile::NamedTempFile::new_in(&self.config.data_dir).map_err(|e| {
            Error::Storage(format!(
                "Failed to create temporary file in '{}': {}",
                self.config.data_dir.display(),
                e
            ))
        })?;
        temp.write_all(value.as_bytes())?;
        temp.persist(&path).map_err(|e| {
            Error::Storage(format!("Failed to replace '{}': {}", path.display(), e))
        })?;

        tracing::trace!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                Error::Storage(format!("Failed to remove '{}': {}", path.display(), e))
            })?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.config.data_dir)?.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn health_check(&self) -> Result<HealthStatus> {
        if !self.config.data_dir.is_dir() {
            return Ok(HealthStatus::Unavailable(format!(
                "data directory '{}' is missing",
                self.config.data_dir.display()
            )));
        }

        let size_mb = self.size_bytes() as f64 / (1024.0 * 1024.0);
        if size_mb > self.config.max_size_mb as f64 * 0.9 {
            return Ok(HealthStatus::Warning(format!(
                "{:.1} MB of {} MB used",
                size_mb, self.config.max_size_mb
            )));
        }

        Ok(HealthStatus::Healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use predicates::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_storage_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::open(temp_dir.path()).unwrap();

        storage.set_item("comments", r#"[{"id":"1"}]"#).unwrap();
        assert_eq!(
            storage.get_item("comments").unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );

        // A second handle on the same directory sees the same data
        let reopened = FileStorage::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.keys().unwrap(), vec!["comments"]);
    }

    #[test]
    fn test_file_storage_writes_one_file_per_key() {
        let temp = assert_fs::TempDir::new().unwrap();
        let storage = FileStorage::open(temp.path()).unwrap();

        storage.set_item("article_views", "[]").unwrap();
        storage.set_item("darkMode", "true").unwrap();

        temp.child("article_views.json").assert(predicate::path::exists());
        temp.child("darkMode.json").assert("true");

        storage.remove_item("darkMode").unwrap();
        temp.child("darkMode.json").assert(predicate::path::missing());
    }

    #[test]
    fn test_file_storage_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::open(temp_dir.path()).unwrap();

        assert!(storage.set_item("../escape", "x").is_err());
        assert!(storage.get_item("").is_err());
    }

    #[test]
    fn test_file_storage_size_limit() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(FileStorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            max_size_mb: 0,
        })
        .unwrap();

        let err = storage.set_item("articles", "[]").unwrap_err();
        assert_eq!(err.error_code(), "QUOTA_EXCEEDED");
        assert!(storage.get_item("articles").unwrap().is_none());
    }

    #[test]
    fn test_file_storage_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("data");
        let storage = FileStorage::open(&nested).unwrap();

        assert!(nested.is_dir());
        assert_eq!(storage.health_check().unwrap(), HealthStatus::Healthy);
    }

    #[test]
    fn test_cleanup_removes_only_temporary_files() {
        let temp = assert_fs::TempDir::new().unwrap();
        let storage = FileStorage::open(temp.path()).unwrap();
        storage.set_item("comments", "[]").unwrap();
        temp.child(".tmpX1y2Z3").write_str("[{").unwrap();

        assert_eq!(storage.cleanup().unwrap(), 1);
        assert_eq!(storage.cleanup().unwrap(), 0);
        temp.child(".tmpX1y2Z3").assert(predicate::path::missing());
        temp.child("comments.json").assert(predicate::path::exists());
    }
}
