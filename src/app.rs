use std::sync::Arc;

use tracing::{info, warn};

use crate::admin::AdminGate;
use crate::background::{BackgroundTasks, CommentSimulator, DailyReset, ViewSimulator};
use crate::clock::{SharedClock, SystemClock};
use crate::config::{AdminConfig, Config, SimulationConfig, StorageBackend};
use crate::error::Result;
use crate::preferences::Preferences;
use crate::storage::{
    FileStorage, FileStorageConfig, HealthStatus, MemoryStorage, SharedStorage, Storage,
    StorageConfig,
};
use crate::store::{ArticleStore, CommentStore, SubscriberStore, ViewStore};

/// Every store of the site, built on one storage backend and one clock
#[derive(Clone)]
pub struct Stores {
    pub articles: ArticleStore,
    pub comments: CommentStore,
    pub subscribers: SubscriberStore,
    pub views: ViewStore,
    pub preferences: Preferences,
    pub admin: AdminGate,
    storage: SharedStorage,
    clock: SharedClock,
}

impl Stores {
    pub fn new(storage: SharedStorage, clock: SharedClock, admin: AdminConfig) -> Self {
        Self {
            articles: ArticleStore::new(Arc::clone(&storage)),
            comments: CommentStore::new(Arc::clone(&storage), Arc::clone(&clock)),
            subscribers: SubscriberStore::new(Arc::clone(&storage), Arc::clone(&clock)),
            views: ViewStore::new(Arc::clone(&storage), Arc::clone(&clock)),
            preferences: Preferences::new(Arc::clone(&storage)),
            admin: AdminGate::new(Arc::clone(&storage), admin),
            storage,
            clock,
        }
    }

    /// Open the backend named in `config` with the system clock
    pub fn open(config: &Config) -> Result<Self> {
        let storage = open_storage(config)?;
        Ok(Self::new(
            storage,
            Arc::new(SystemClock),
            config.admin.clone(),
        ))
    }

    /// Fresh seeded stores that live only in memory
    pub fn in_memory(clock: SharedClock) -> Self {
        Self::new(
            Arc::new(MemoryStorage::default()),
            clock,
            AdminConfig::default(),
        )
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn health(&self) -> HealthStatus {
        match self.storage.health_check() {
            Ok(status) => status,
            Err(e) => HealthStatus::Unavailable(e.to_string()),
        }
    }

    /// Start the simulators and the midnight reset enabled in `config`.
    /// Must be called from within a tokio runtime.
    pub fn start_background(&self, config: &SimulationConfig) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        if config.daily_reset {
            tasks.push(DailyReset::new(self.views.clone(), Arc::clone(&self.clock)).spawn());
        }

        if config.enabled {
            tasks.push(ViewSimulator::new(self.views.clone(), config).spawn());
            tasks.push(
                CommentSimulator::new(self.articles.clone(), self.comments.clone(), config)
                    .spawn(),
            );
        } else {
            info!("Simulation disabled");
        }

        info!("Started background tasks: {:?}", tasks.names());
        tasks
    }
}

fn open_storage(config: &Config) -> Result<SharedStorage> {
    let max_bytes = config.storage.max_size_mb * 1024 * 1024;

    match config.storage.backend {
        StorageBackend::File => {
            let data_dir = config.resolved_data_dir()?;
            info!("Using file storage at {}", data_dir.display());
            let storage = FileStorage::new(FileStorageConfig {
                data_dir,
                max_size_mb: config.storage.max_size_mb,
            })?;
            match storage.cleanup() {
                Ok(0) => {}
                Ok(removed) => info!("Removed {} leftover temporary files", removed),
                Err(e) => warn!("Storage cleanup failed: {}", e),
            }
            if let Ok(HealthStatus::Warning(msg)) = storage.health_check() {
                warn!("Storage: {}", msg);
            }
            Ok(Arc::new(storage))
        }
        StorageBackend::Memory => {
            warn!("Using memory storage, nothing will survive this process");
            Ok(Arc::new(MemoryStorage::new(StorageConfig {
                quota_bytes: usize::try_from(max_bytes).ok(),
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_stores_are_seeded() {
        let stores = Stores::in_memory(Arc::new(ManualClock::at(2024, 3, 5, 10, 0)));
        assert_eq!(stores.articles.len(), 6);
        assert_eq!(stores.comments.len(), 4);
        assert_eq!(stores.subscribers.len(), 5);
        assert_eq!(stores.views.all().len(), 10);
        assert_eq!(stores.health(), HealthStatus::Healthy);
    }

    #[test]
    fn test_open_file_backend_persists() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = Some(temp_dir.path().to_path_buf());

        let stores = Stores::open(&config).unwrap();
        stores.subscribers.add("nouveau@example.com", Some("test")).unwrap();

        let reopened = Stores::open(&config).unwrap();
        assert!(reopened.subscribers.find_by_email("nouveau@example.com").is_some());
        assert!(temp_dir.path().join("newsletter_subscribers.json").exists());
    }

    #[test]
    fn test_open_file_backend_removes_interrupted_writes() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(".tmpAbC123"), "[{\"id\"").unwrap();
        let mut config = Config::default();
        config.storage.data_dir = Some(temp_dir.path().to_path_buf());

        let stores = Stores::open(&config).unwrap();

        assert!(!temp_dir.path().join(".tmpAbC123").exists());
        assert_eq!(stores.articles.len(), 6);
    }

    #[tokio::test]
    async fn test_start_background_respects_flags() {
        let stores = Stores::in_memory(Arc::new(ManualClock::at(2024, 3, 5, 10, 0)));

        let mut config = SimulationConfig::default();
        let tasks = stores.start_background(&config);
        assert_eq!(
            tasks.names(),
            vec!["daily-reset", "view-simulator", "comment-simulator"]
        );
        tasks.shutdown().await;

        config.enabled = false;
        config.daily_reset = false;
        let tasks = stores.start_background(&config);
        assert!(tasks.is_empty());
        tasks.shutdown().await;
    }
}
