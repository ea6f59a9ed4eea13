use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DashConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

/// Location of the persisted store and its backups.
///
/// `store_path` has no default; the server refuses to start without one.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub store_path: Option<String>,
    pub backups_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_n_results: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            log_level: "info".into(),
            host: "127.0.0.1".into(),
            port: 8765,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_memdash_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_n_results: 5,
        }
    }
}

/// Returns `~/.memdash/`
pub fn default_memdash_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".memdash")
}

/// Returns the default config file path: `~/.memdash/config.toml`
pub fn default_config_path() -> PathBuf {
    default_memdash_dir().join("config.toml")
}

impl DashConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            DashConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (MEMDASH_STORE_PATH, MEMDASH_BACKUPS_PATH, MEMDASH_LOG_LEVEL, MEMDASH_EMBEDDING).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MEMDASH_STORE_PATH") {
            self.storage.store_path = Some(val);
        }
        if let Ok(val) = std::env::var("MEMDASH_BACKUPS_PATH") {
            self.storage.backups_path = Some(val);
        }
        if let Ok(val) = std::env::var("MEMDASH_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("MEMDASH_EMBEDDING") {
            self.embedding.provider = val;
        }
    }

    /// Resolve the persisted store directory. Fails when none is configured.
    pub fn resolved_store_path(&self) -> Result<PathBuf> {
        match self.storage.store_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Ok(expand_tilde(path)),
            _ => anyhow::bail!(
                "store path not configured: set MEMDASH_STORE_PATH or [storage] store_path"
            ),
        }
    }

    /// Resolve the backups directory, defaulting to a `backups` sibling of the store.
    pub fn resolved_backups_path(&self) -> Result<PathBuf> {
        if let Some(path) = self.storage.backups_path.as_deref() {
            if !path.trim().is_empty() {
                return Ok(expand_tilde(path));
            }
        }
        let store = self.resolved_store_path()?;
        let parent = store
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(parent.join("backups"))
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
