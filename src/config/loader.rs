//! Configuration loader with tier-based merging.
//!
//! Tiers, lowest to highest priority: embedded defaults, project
//! `taskboard/config.yaml`, user `~/.taskboard/config.yaml`, environment.

use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    Project = 1,
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let user_dir = std::env::var("TASKBOARD_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".taskboard")));

        let project_dir = std::env::var("TASKBOARD_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("taskboard")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }

    fn config_file(dir: Option<&Path>) -> Option<PathBuf> {
        let file = dir?.join("config.yaml");
        file.exists().then_some(file)
    }
}

/// Merge `overlay` into `base`. Objects merge key by key; everything else,
/// arrays included, is replaced. A null overlay keeps the base value.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let next = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, next);
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Files that contributed to the merged configuration, in merge order.
    sources: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        // An explicit file replaces the tier search entirely.
        if let Ok(explicit) = std::env::var("TASKBOARD_CONFIG_PATH") {
            return Self::load_file(PathBuf::from(explicit), paths);
        }

        let mut merged = serde_json::to_value(Config::default())?;
        let mut sources = Vec::new();

        let tiers = [
            (ConfigTier::Project, paths.project_dir.as_deref()),
            (ConfigTier::User, paths.user_dir.as_deref()),
        ];
        for (tier, dir) in tiers {
            let Some(file) = ConfigPaths::config_file(dir) else {
                continue;
            };
            match read_yaml(&file) {
                Ok(value) => {
                    debug!(tier = %tier, path = %file.display(), "Merging config file");
                    merged = deep_merge(merged, value);
                    sources.push((tier, file));
                }
                Err(e) => {
                    warn!(tier = %tier, path = %file.display(), error = %e, "Ignoring unreadable config file");
                }
            }
        }

        let mut config: Config =
            serde_json::from_value(merged).context("Merged configuration is invalid")?;
        Self::apply_env_overrides(&mut config);
        config.validate()?;

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    /// Load a single explicit config file, skipping the project and user tiers.
    /// Environment overrides still apply.
    pub fn load_file(path: PathBuf, paths: ConfigPaths) -> Result<Self> {
        let mut config = Config::load(&path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        Self::apply_env_overrides(&mut config);
        config.validate()?;
        Ok(Self {
            paths,
            config,
            sources: vec![(ConfigTier::Project, path)],
        })
    }

    /// Apply environment variable overrides to config.
    fn apply_env_overrides(config: &mut Config) {
        if let Ok(db_path) = std::env::var("TASKBOARD_DB_PATH") {
            config.server.db_path = PathBuf::from(db_path);
        }

        if let Ok(port) = std::env::var("TASKBOARD_PORT") {
            match port.parse() {
                Ok(port) => config.server.port = port,
                Err(_) => warn!(value = %port, "Ignoring invalid TASKBOARD_PORT"),
            }
        }

        if let Ok(local_path) = std::env::var("TASKBOARD_LOCAL_STORE") {
            config.store.local_path = PathBuf::from(local_path);
        }

        if let Ok(url) = std::env::var("TASKBOARD_REMOTE_URL") {
            config.store.remote_url = url;
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Files merged into the configuration, lowest tier first.
    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_yaml::from_str(&content)?;
    Ok(value)
}
