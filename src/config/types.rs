//! Configuration types and structures.

use crate::board::{ColumnDef, ColumnSet, PhasePolicy};
use crate::error::{BoardError, BoardResult};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default port for the task store API.
pub const DEFAULT_PORT: u16 = 31995;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub board: BoardConfig,
}

impl Config {
    /// Load configuration from a single YAML file (no tier merging).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate cross-field constraints. Called once after loading.
    pub fn validate(&self) -> BoardResult<()> {
        self.board.column_set().map(|_| ())
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// Task store server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Interface the API binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the API (default: 31995).
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("taskboard/tasks.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Which repository backend the board manager talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// The SQLite database directly.
    #[default]
    Sqlite,
    /// A JSON file holding the persisted ticket list.
    Local,
    /// A running task store API.
    Remote,
}

/// Repository backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Path of the local ticket list used by the `local` backend.
    #[serde(default = "default_local_path")]
    pub local_path: PathBuf,

    /// Base URL of the task store API used by the `remote` backend.
    #[serde(default = "default_remote_url")]
    pub remote_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            local_path: default_local_path(),
            remote_url: default_remote_url(),
        }
    }
}

fn default_local_path() -> PathBuf {
    PathBuf::from("taskboard/tickets.json")
}

fn default_remote_url() -> String {
    format!("http://127.0.0.1:{}", DEFAULT_PORT)
}

/// Board layout and lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Ordered lane definitions. Replaced wholesale when overridden.
    #[serde(default = "default_columns")]
    pub columns: Vec<ColumnDef>,

    /// Lane for tickets created inside the dashboard.
    #[serde(default = "default_initial_column")]
    pub initial_column: String,

    /// Lane for externally submitted tickets. Falls back to `initial_column`.
    #[serde(default = "default_external_column")]
    pub external_column: Option<String>,

    /// How the task editor may change a task's phase.
    #[serde(default)]
    pub phase_policy: PhasePolicy,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            initial_column: default_initial_column(),
            external_column: default_external_column(),
            phase_policy: PhasePolicy::default(),
        }
    }
}

fn default_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("external", "External Tickets"),
        ColumnDef::new("backlog", "Backlog Tasks"),
        ColumnDef::new("todo", "To Do Tasks"),
        ColumnDef::new("in-progress", "In Process"),
        ColumnDef::new("done", "Done"),
    ]
}

fn default_initial_column() -> String {
    "backlog".to_string()
}

fn default_external_column() -> Option<String> {
    Some("external".to_string())
}

impl BoardConfig {
    /// Build the validated column set, checking the intake lanes are members.
    pub fn column_set(&self) -> BoardResult<ColumnSet> {
        let set = ColumnSet::new(self.columns.clone())?;
        if !set.contains(&self.initial_column) {
            return Err(BoardError::invalid_column_set(format!(
                "initial_column '{}' is not a configured column",
                self.initial_column
            ))
            .with_field("board.initial_column"));
        }
        if let Some(ref external) = self.external_column {
            if !set.contains(external) {
                return Err(BoardError::invalid_column_set(format!(
                    "external_column '{}' is not a configured column",
                    external
                ))
                .with_field("board.external_column"));
            }
        }
        Ok(set)
    }

    /// The lane a new ticket from the given intake lands in.
    pub fn lane_for(&self, lane: crate::types::TicketLane) -> &str {
        match lane {
            crate::types::TicketLane::Internal => &self.initial_column,
            crate::types::TicketLane::External => self
                .external_column
                .as_deref()
                .unwrap_or(&self.initial_column),
        }
    }
}
