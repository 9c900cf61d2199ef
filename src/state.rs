use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::db::MappingDb;
use crate::error::ServiceError;
use crate::services::coverage::DEFAULT_COVERAGE_THRESHOLD;

/// Service configuration, read from `~/.reportmap/config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Defaults to `~/.reportmap/reportmap.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_coverage_threshold")]
    pub coverage_threshold: usize,
    /// Seed file applied at startup when the database is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_path: Option<String>,
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_coverage_threshold() -> usize {
    DEFAULT_COVERAGE_THRESHOLD
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            bind_address: default_bind_address(),
            coverage_threshold: default_coverage_threshold(),
            seed_path: None,
        }
    }
}

impl Config {
    /// Resolve the database file to open.
    pub fn database_path(&self) -> Result<PathBuf, String> {
        match &self.database_path {
            Some(p) => Ok(PathBuf::from(p)),
            None => MappingDb::default_path().map_err(|e| e.to_string()),
        }
    }
}

/// Load config from `~/.reportmap/config.json`, then apply env overrides.
/// A missing file means defaults.
pub fn load_config() -> Result<Config, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    let config_path = home.join(".reportmap").join("config.json");
    let config = load_config_from(&config_path)?;
    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

/// Load config from an explicit path. A missing file means defaults.
pub fn load_config_from(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;
    let config: Config =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?;

    if config.coverage_threshold == 0 {
        return Err("coverageThreshold must be at least 1".to_string());
    }
    Ok(config)
}

/// `DATABASE_PATH` and `REPORTMAP_BIND` win over the file.
pub fn apply_env_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(path) = lookup("DATABASE_PATH").filter(|v| !v.trim().is_empty()) {
        config.database_path = Some(path);
    }
    if let Some(bind) = lookup("REPORTMAP_BIND").filter(|v| !v.trim().is_empty()) {
        config.bind_address = bind;
    }
    config
}

/// Shared state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    /// rusqlite::Connection is Send but not Sync; one writer at a time.
    pub db: Arc<Mutex<MappingDb>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: MappingDb, config: Config) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config: Arc::new(config),
        }
    }

    /// Run a store operation on the blocking pool.
    pub async fn with_db<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&MappingDb) -> Result<T, ServiceError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock();
            f(&guard)
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("Store task failed: {}", e)))?
    }
}
