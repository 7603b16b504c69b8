//! Configuration types.

use crate::format::OutputFormat;
use crate::listing::ListingOptions;
use crate::listing::pager::DEFAULT_PAGE_SIZE;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default port for the HTTP API.
pub const DEFAULT_UI_PORT: u16 = 31995;

/// Whether the HTTP API runs next to the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiMode {
    /// MCP over stdio only (default)
    #[default]
    None,
    /// Also serve the read-only HTTP API
    Web,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub mode: UiMode,

    #[serde(default = "default_ui_port")]
    pub port: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            mode: UiMode::default(),
            port: default_ui_port(),
        }
    }
}

fn default_ui_port() -> u16 {
    DEFAULT_UI_PORT
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub listing: ListingConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

/// Store and output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// How long a read waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Connections kept for concurrent requests.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Output format used when a call does not ask for one.
    #[serde(default)]
    pub default_format: OutputFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_size: default_pool_size(),
            default_format: OutputFormat::default(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("support-desk/desk.db")
}

fn default_busy_timeout_ms() -> u64 {
    crate::db::DEFAULT_BUSY_TIMEOUT_MS
}

fn default_pool_size() -> u32 {
    crate::db::DEFAULT_POOL_SIZE
}

/// Ticket listing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Tickets per page.
    #[serde(default = "default_page_size")]
    pub page_size: i64,

    /// Let free-text search also match message bodies.
    #[serde(default)]
    pub search_message_body: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_message_body: false,
        }
    }
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl ListingConfig {
    pub fn options(&self) -> ListingOptions {
        ListingOptions {
            page_size: self.page_size,
            search_message_body: self.search_message_body,
        }
    }
}

impl Config {
    /// Load configuration from a single YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.listing.page_size <= 0 {
            return Err(anyhow!(
                "listing.page_size must be positive, got {}",
                self.listing.page_size
            ));
        }
        if self.server.pool_size == 0 {
            return Err(anyhow!("server.pool_size must be at least 1"));
        }
        if self.ui.mode == UiMode::Web && self.ui.port == 0 {
            return Err(anyhow!("ui.port must be set when ui.mode is web"));
        }
        Ok(())
    }
}
