//! Configuration surface: storage paths and the allowed CORS origin.
//!
//! Paths are explicit and passed into each component at construction;
//! nothing reads ambient module-level globals. Precedence for every setting
//! is flag > config file > environment > default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the allowed frontend origin
pub const ORIGIN_ENV: &str = "FRONT_URL";

/// Origin allowed when neither flag, config, nor environment names one
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MarketConfig {
    pub database: Option<String>,
    pub images: Option<String>,
    pub origin: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("marketd.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("db").join("marketd.sqlite3")
}

pub fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<MarketConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: MarketConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &MarketConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Allowed origin from the environment, or the localhost default
pub fn origin_from_env() -> String {
    std::env::var(ORIGIN_ENV).unwrap_or_else(|_| DEFAULT_ORIGIN.to_string())
}

/// Resolve a setting through the flag > config > fallback chain
pub fn resolve_setting<T>(flag: Option<T>, from_config: Option<T>, fallback: T) -> T {
    flag.or(from_config).unwrap_or(fallback)
}
