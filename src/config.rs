use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Directory holding one JSON file per storage key
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_view_interval")]
    pub view_interval_secs: u64,

    #[serde(default = "default_view_probability")]
    pub view_probability: f64,

    #[serde(default = "default_comment_min_delay")]
    pub comment_min_delay_secs: u64,

    #[serde(default = "default_comment_max_delay")]
    pub comment_max_delay_secs: u64,

    #[serde(default = "default_comment_probability")]
    pub comment_probability: f64,

    #[serde(default = "default_max_comments_per_article")]
    pub max_comments_per_article: usize,

    #[serde(default = "default_true")]
    pub daily_reset: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,

    #[serde(default = "default_admin_password")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub log_to_file: bool,

    #[serde(default = "default_log_file")]
    pub log_file: String,

    #[serde(default)]
    pub json_format: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|_| ConfigError::NotFound(path.as_ref().display().to_string()))?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the default location; fall back to defaults
    /// when no file exists there.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_file()?,
        };

        if path.exists() {
            Self::load_with_env(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            let mut config = Self::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;

        if sim.view_interval_secs == 0 {
            return Err(ConfigError::Config(
                "view_interval_secs must be greater than 0".to_string(),
            ));
        }

        if sim.comment_min_delay_secs == 0
            || sim.comment_min_delay_secs > sim.comment_max_delay_secs
        {
            return Err(ConfigError::Config(
                "comment delays must satisfy 0 < min <= max".to_string(),
            ));
        }

        for (name, p) in [
            ("view_probability", sim.view_probability),
            ("comment_probability", sim.comment_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Config(format!("{} must be between 0 and 1", name)));
            }
        }

        if self.admin.username.trim().is_empty() || self.admin.password.is_empty() {
            return Err(ConfigError::Config("admin credentials cannot be empty".to_string()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("CARA_STORE_DATA_DIR") {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }

        if let Ok(level) = std::env::var("CARA_STORE_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(enabled) = std::env::var("CARA_STORE_SIMULATION") {
            if let Ok(val) = enabled.parse() {
                self.simulation.enabled = val;
            }
        }

        if let Ok(password) = std::env::var("CARA_STORE_ADMIN_PASSWORD") {
            self.admin.password = password;
        }
    }

    /// Where the stores keep their data
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::data_dir(),
        }
    }

    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("cara-store"))
            .ok_or_else(|| ConfigError::Config("Could not determine config directory".to_string()))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("cara-store"))
            .ok_or_else(|| ConfigError::Config("Could not determine data directory".to_string()))
    }
}

impl SimulationConfig {
    pub fn view_interval(&self) -> Duration {
        Duration::from_secs(self.view_interval_secs)
    }

    pub fn comment_delay_range(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.comment_min_delay_secs),
            Duration::from_secs(self.comment_max_delay_secs),
        )
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: None,
            max_size_mb: default_max_size_mb(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            view_interval_secs: default_view_interval(),
            view_probability: default_view_probability(),
            comment_min_delay_secs: default_comment_min_delay(),
            comment_max_delay_secs: default_comment_max_delay(),
            comment_probability: default_comment_probability(),
            max_comments_per_article: default_max_comments_per_article(),
            daily_reset: true,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: default_admin_password(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_to_file: false,
            log_file: default_log_file(),
            json_format: false,
        }
    }
}

fn default_true() -> bool { true }
fn default_backend() -> StorageBackend { StorageBackend::File }
fn default_max_size_mb() -> u64 { 5 }

fn default_view_interval() -> u64 { 30 }
fn default_view_probability() -> f64 { 0.3 }
fn default_comment_min_delay() -> u64 { 2 * 60 }
fn default_comment_max_delay() -> u64 { 5 * 60 }
fn default_comment_probability() -> f64 { 0.4 }
fn default_max_comments_per_article() -> usize { 15 }

fn default_admin_username() -> String { "admin".to_string() }
fn default_admin_password() -> String { "Developpeur".to_string() }

fn default_log_level() -> String { "warn".to_string() }
fn default_log_file() -> String { "logs/cara-store.log".to_string() }
