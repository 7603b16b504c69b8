//! Configuration.
//!
//! Defaults, then `support-desk/config.yaml` in the working directory, then
//! `~/.support-desk/config.yaml`, merged field by field. Environment:
//! - `SUPPORT_DESK_DB_PATH` - database path
//! - `SUPPORT_DESK_PAGE_SIZE` - listing page size
//! - `SUPPORT_DESK_UI_PORT` - HTTP API port
//! - `SUPPORT_DESK_PROJECT_DIR` / `SUPPORT_DESK_USER_DIR` - tier directories

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths};
pub use types::*;
