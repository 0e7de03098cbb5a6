// src/config/mod.rs
//! Process configuration: env-driven paths and the TOML documents they point to.

pub mod profile;
pub mod sources;

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_PROFILE_PATH: &str = "PROFILE_PATH";
pub const ENV_RANKING_CONFIG_PATH: &str = "RANKING_CONFIG_PATH";
pub const ENV_SOURCES_CONFIG_PATH: &str = "SOURCES_CONFIG_PATH";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/digest.db";
pub const DEFAULT_PROFILE_PATH: &str = "config/profile.toml";
pub const DEFAULT_RANKING_CONFIG_PATH: &str = "config/ranking.toml";
pub const DEFAULT_SOURCES_CONFIG_PATH: &str = "config/sources.toml";

/// Resolved locations of everything the service needs at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub profile_path: PathBuf,
    pub ranking_path: PathBuf,
    pub sources_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let path = |env: &str, default: &str| {
            std::env::var(env)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };
        Self {
            database_url: std::env::var(ENV_DATABASE_URL)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            profile_path: path(ENV_PROFILE_PATH, DEFAULT_PROFILE_PATH),
            ranking_path: path(ENV_RANKING_CONFIG_PATH, DEFAULT_RANKING_CONFIG_PATH),
            sources_path: path(ENV_SOURCES_CONFIG_PATH, DEFAULT_SOURCES_CONFIG_PATH),
        }
    }
}

/// Read and deserialize a TOML file.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Load `path` if the file exists, otherwise return `fallback()`.
///
/// A path that came from an explicit env override must exist; silently
/// falling back there would hide a misconfigured deployment.
pub fn load_toml_or<T: DeserializeOwned>(
    path: &Path,
    env_override: &str,
    fallback: impl FnOnce() -> T,
) -> Result<T> {
    if path.exists() {
        return load_toml(path);
    }
    if std::env::var(env_override).is_ok_and(|v| !v.trim().is_empty()) {
        return Err(anyhow!(
            "{env_override} points to non-existent path {}",
            path.display()
        ));
    }
    tracing::info!(path = %path.display(), "config file not found, using built-in defaults");
    Ok(fallback())
}
