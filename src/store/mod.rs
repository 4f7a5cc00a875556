//! Task repositories: the seam between the board and where tasks live.
//!
//! Three backends implement [`TaskRepository`]:
//! - [`SqliteRepository`] talks to the database directly.
//! - [`LocalRepository`] keeps an ordered JSON ticket list on disk.
//! - [`RemoteRepository`] calls a running task store API.

mod local;
mod remote;
mod sqlite;

pub use local::LocalRepository;
pub use remote::RemoteRepository;
pub use sqlite::SqliteRepository;

use crate::config::{BoardConfig, Config, StoreBackend};
use crate::db::{Database, now_ms};
use crate::error::{BoardError, BoardResult};
use crate::types::{NewTicket, Task, new_id};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task not found: {id}")]
    NotFound { id: String },

    #[error("task already exists: {id}")]
    Conflict { id: String },

    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Where tasks are persisted. Writes are last-writer-wins.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// All tasks, in the backend's natural order.
    async fn list_tasks(&self) -> StoreResult<Vec<Task>>;

    async fn get_task(&self, id: &str) -> StoreResult<Option<Task>>;

    /// Insert a new task. Fails with `Conflict` if the id is taken.
    async fn create_task(&self, task: &Task) -> StoreResult<()>;

    /// Persist a status change only.
    async fn update_status(&self, id: &str, status: &str) -> StoreResult<()>;

    /// Persist the full field set of an existing task.
    async fn save_task(&self, task: &Task) -> StoreResult<()>;

    fn backend(&self) -> &'static str;
}

/// Build the task for a new ticket, placing it in its intake lane.
pub fn build_ticket(ticket: NewTicket, board: &BoardConfig) -> BoardResult<Task> {
    if ticket.title.trim().is_empty() {
        return Err(BoardError::missing_field("title"));
    }
    if let Some(ref id) = ticket.id {
        if id.trim().is_empty() {
            return Err(BoardError::invalid_value("id", "id must not be blank"));
        }
    }

    let now = now_ms();
    Ok(Task {
        id: ticket.id.unwrap_or_else(new_id),
        title: ticket.title,
        description: ticket.description,
        status: board.lane_for(ticket.lane).to_string(),
        assignees: ticket.assignees,
        comments: Vec::new(),
        attachments: Vec::new(),
        created_at: now,
        updated_at: now,
    })
}

/// Open the repository selected by `config.store.backend`.
pub fn open_repository(config: &Config) -> anyhow::Result<Arc<dyn TaskRepository>> {
    let repo: Arc<dyn TaskRepository> = match config.store.backend {
        StoreBackend::Sqlite => {
            config.ensure_db_dir()?;
            let db = Database::open(&config.server.db_path)?;
            Arc::new(SqliteRepository::new(db))
        }
        StoreBackend::Local => Arc::new(LocalRepository::new(&config.store.local_path)),
        StoreBackend::Remote => Arc::new(RemoteRepository::new(&config.store.remote_url)?),
    };
    tracing::debug!(backend = repo.backend(), "Opened task repository");
    Ok(repo)
}
