//! Tiered configuration loading.
//!
//! Tiers, lowest priority first: built-in defaults, project
//! `support-desk/config.yaml`, user `~/.support-desk/config.yaml`, then
//! environment variables. An explicit `--config` file replaces the file tiers.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_DB_PATH: &str = "SUPPORT_DESK_DB_PATH";
pub const ENV_PAGE_SIZE: &str = "SUPPORT_DESK_PAGE_SIZE";
pub const ENV_UI_PORT: &str = "SUPPORT_DESK_UI_PORT";
pub const ENV_PROJECT_DIR: &str = "SUPPORT_DESK_PROJECT_DIR";
pub const ENV_USER_DIR: &str = "SUPPORT_DESK_USER_DIR";

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Resolve the tier directories from the environment, falling back to
    /// `./support-desk` and `~/.support-desk`.
    pub fn discover() -> Self {
        let project_dir = std::env::var(ENV_PROJECT_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("support-desk")));
        let user_dir = std::env::var(ENV_USER_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".support-desk")));
        Self {
            project_dir,
            user_dir,
        }
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Loaded configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: Config,
    /// Highest-priority file that contributed, if any.
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load from the discovered tiers and the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(ConfigPaths::discover(), explicit, |key| std::env::var(key).ok())
    }

    /// Load with explicit tier directories and environment lookup.
    pub fn load_with<F>(paths: ConfigPaths, explicit: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (mut config, config_path) = match explicit {
            Some(path) => {
                let config = Config::load(path)
                    .with_context(|| format!("failed to load config {}", path.display()))?;
                (config, Some(path.to_path_buf()))
            }
            None => Self::merge_tiers(&paths)?,
        };

        apply_env_overrides(&mut config, env)?;
        config.validate()?;

        Ok(Self {
            config,
            config_path,
        })
    }

    fn merge_tiers(paths: &ConfigPaths) -> Result<(Config, Option<PathBuf>)> {
        let mut tiers: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut used = None;

        for dir in [&paths.project_dir, &paths.user_dir].into_iter().flatten() {
            let file = dir.join("config.yaml");
            if !file.exists() {
                continue;
            }
            match read_yaml(&file) {
                Ok(value) => {
                    debug!(path = %file.display(), "loaded config tier");
                    tiers.push(value);
                    used = Some(file);
                }
                Err(e) => warn!(path = %file.display(), error = %e, "ignoring unreadable config"),
            }
        }

        let config: Config = serde_json::from_value(deep_merge_all(tiers))?;
        Ok((config, used))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

fn apply_env_overrides<F>(config: &mut Config, env: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(db_path) = env(ENV_DB_PATH) {
        config.server.db_path = PathBuf::from(db_path);
    }
    if let Some(raw) = env(ENV_PAGE_SIZE) {
        config.listing.page_size = raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be an integer, got '{}'", ENV_PAGE_SIZE, raw))?;
    }
    if let Some(raw) = env(ENV_UI_PORT) {
        config.ui.port = raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a port number, got '{}'", ENV_UI_PORT, raw))?;
    }
    Ok(())
}
