//! Configuration system.
//!
//! Consolidates configuration from tiers with field-by-field YAML merging:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `$CWD/taskboard/config.yaml`
//! 3. **User** - `~/.taskboard/config.yaml`
//! 4. **Environment** - variables below
//!
//! ## Environment Variables
//! - `TASKBOARD_CONFIG_PATH` - Explicit config file (overrides all tiers)
//! - `TASKBOARD_DB_PATH` - Database path
//! - `TASKBOARD_PORT` - API port
//! - `TASKBOARD_LOCAL_STORE` - Local ticket list path
//! - `TASKBOARD_REMOTE_URL` - Remote task store base URL
//! - `TASKBOARD_USER_DIR` - User config dir (default: `~/.taskboard`)
//! - `TASKBOARD_PROJECT_DIR` - Project config dir (default: `./taskboard`)

mod loader;
mod types;

pub use crate::board::{ColumnDef, PhasePolicy};
pub use loader::{ConfigLoader, ConfigPaths, ConfigTier, deep_merge};
pub use types::*;
