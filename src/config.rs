use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;

const APP_DIR: &str = "studyplan";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_DB_NAME: &str = "studyplan.db";

pub const DB_ENV: &str = "STUDYPLAN_DB";
pub const USER_ENV: &str = "STUDYPLAN_USER";
pub const CONFIG_ENV: &str = "STUDYPLAN_CONFIG";

/// Persistent settings kept in `<config_dir>/studyplan/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logged-in user name, written by `login` and cleared by `logout`
    pub user: Option<String>,
    /// Database location; falls back to the platform config dir
    pub database: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// A missing file is an empty config, not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "saved config");
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        resolve_db_path(env_value(DB_ENV), self.database.as_deref())
    }

    /// Active user: `--user` flag, then `STUDYPLAN_USER`, then the logged-in user.
    pub fn active_user(&self, flag: Option<&str>) -> Option<String> {
        resolve_user(flag, env_value(USER_ENV), self.user.as_deref())
    }
}

pub fn config_path() -> PathBuf {
    match env_value(CONFIG_ENV) {
        Some(path) => PathBuf::from(path),
        None => app_dir().join(CONFIG_FILE),
    }
}

fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

// Blank env vars count as unset
fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn resolve_db_path(env: Option<String>, configured: Option<&Path>) -> PathBuf {
    if let Some(path) = env {
        return PathBuf::from(path);
    }
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    app_dir().join(DEFAULT_DB_NAME)
}

fn resolve_user(flag: Option<&str>, env: Option<String>, configured: Option<&str>) -> Option<String> {
    flag.map(str::to_string)
        .or(env)
        .or_else(|| configured.map(str::to_string))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}
