//! Board state manager: optimistic moves persisted through a repository.
//!
//! Every board mutation is applied locally first. Persistence then runs on
//! the repository; each in-flight write is recorded in a pending map keyed by
//! task id. When a write fails and it is still the newest write for that
//! task, the task is restored to its last confirmed state. A failure that a
//! newer write has already superseded is reported and left alone.

use super::editor::TaskEditor;
use super::state::{Board, BoardSummary, LoadSummary, MoveOutcome, MoveRecord, TaskSnapshot};
use crate::config::BoardConfig;
use crate::error::{BoardError, BoardResult};
use crate::store::{StoreError, TaskRepository, build_ticket};
use crate::types::{NewTicket, Task};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// What happened to a write after persistence finished.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Nothing was changed, nothing was persisted.
    Unchanged,
    Persisted,
    /// The write failed and the task was restored to its confirmed state.
    RolledBack { error: StoreError },
    /// The write failed but a newer write for the same task is in flight.
    Superseded { error: StoreError },
}

impl SyncOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, SyncOutcome::Persisted)
    }
}

#[derive(Debug)]
struct PendingEntry {
    latest_seq: u64,
    /// Last state known to match the store.
    confirmed: TaskSnapshot,
}

/// Handle for a write whose local change is applied but not yet persisted.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    seq: u64,
    task: Task,
    kind: WriteKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteKind {
    Status,
    Full,
}

impl PendingWrite {
    pub fn task_id(&self) -> &str {
        &self.task.id
    }

    pub fn task(&self) -> &Task {
        &self.task
    }
}

/// The board and its in-flight writes. Guarded by one lock so a local
/// change and its pending entry are always recorded together.
#[derive(Debug)]
struct BoardState {
    board: Board,
    pending: HashMap<String, PendingEntry>,
    next_seq: u64,
}

impl BoardState {
    /// Record a pending write for a task whose prior state is `before`.
    fn register(&mut self, before: TaskSnapshot, task: Task, kind: WriteKind) -> PendingWrite {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.pending
            .entry(task.id.clone())
            .and_modify(|entry| entry.latest_seq = seq)
            .or_insert(PendingEntry {
                latest_seq: seq,
                confirmed: before,
            });
        PendingWrite { seq, task, kind }
    }

    fn begin_from(&mut self, outcome: MoveOutcome) -> Option<PendingWrite> {
        match outcome {
            MoveOutcome::Moved(record) => {
                debug!(task_id = %record.task_id, from = %record.from, to = %record.to, "Applied move");
                Some(self.register_move(record))
            }
            MoveOutcome::Unchanged(reason) => {
                debug!(?reason, "Move ignored");
                None
            }
        }
    }

    fn register_move(&mut self, record: MoveRecord) -> PendingWrite {
        let mut task = self
            .board
            .task(&record.task_id)
            .cloned()
            .unwrap_or_else(|| record.before.task.clone());
        task.status = record.to.clone();
        self.register(record.before, task, WriteKind::Status)
    }

    fn settle(&mut self, write: PendingWrite, result: Result<(), StoreError>) -> SyncOutcome {
        let task_id = write.task.id.clone();
        let Some(entry) = self.pending.get_mut(&task_id) else {
            return match result {
                Ok(()) => SyncOutcome::Persisted,
                Err(error) => SyncOutcome::Superseded { error },
            };
        };
        let is_latest = entry.latest_seq == write.seq;

        match result {
            Ok(()) => {
                if is_latest {
                    self.pending.remove(&task_id);
                } else {
                    // The store now holds this write's state. Newer writes
                    // that fail roll back to it, at the end of its column.
                    entry.confirmed = TaskSnapshot {
                        task: write.task,
                        location: None,
                    };
                }
                debug!(task_id = %task_id, seq = write.seq, "Write persisted");
                SyncOutcome::Persisted
            }
            Err(error) if is_latest => {
                if let Some(entry) = self.pending.remove(&task_id) {
                    warn!(task_id = %task_id, error = %error, "Write failed, rolling back");
                    self.board.restore(entry.confirmed);
                }
                SyncOutcome::RolledBack { error }
            }
            Err(error) => {
                warn!(task_id = %task_id, error = %error, "Write failed but was superseded");
                SyncOutcome::Superseded { error }
            }
        }
    }
}

pub struct BoardManager {
    state: Mutex<BoardState>,
    repo: Arc<dyn TaskRepository>,
    config: BoardConfig,
}

impl BoardManager {
    pub fn new(config: BoardConfig, repo: Arc<dyn TaskRepository>) -> BoardResult<Self> {
        let set = config.column_set()?;
        Ok(Self {
            state: Mutex::new(BoardState {
                board: Board::new(set),
                pending: HashMap::new(),
                next_seq: 0,
            }),
            repo,
            config,
        })
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, BoardState> {
        // A panic while holding the lock leaves a structurally valid board.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fetch the task list and replace the board. On failure the board keeps
    /// its prior state.
    pub async fn refresh(&self) -> Result<LoadSummary, StoreError> {
        let tasks = match self.repo.list_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(backend = self.repo.backend(), error = %e, "Failed to fetch tasks, keeping current board");
                return Err(e);
            }
        };
        let summary = self.state().board.load(tasks);
        info!(placed = summary.placed, unplaced = summary.unplaced, "Board loaded");
        Ok(summary)
    }

    /// A copy of the current board.
    pub fn snapshot(&self) -> Board {
        self.state().board.clone()
    }

    pub fn summary(&self) -> BoardSummary {
        self.state().board.summary()
    }

    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.state().board.task(task_id).cloned()
    }

    /// Number of tasks with a write in flight.
    pub fn pending_count(&self) -> usize {
        self.state().pending.len()
    }

    /// Apply a move locally. Returns the write to persist, or `None` when the
    /// move was a no-op.
    pub fn begin_move(&self, task_id: &str, from: &str, to: &str) -> Option<PendingWrite> {
        let mut state = self.state();
        let outcome = state.board.move_task(task_id, from, to);
        state.begin_from(outcome)
    }

    /// Apply a drag-and-drop gesture locally.
    pub fn begin_drop(
        &self,
        task_id: &str,
        source_container: Option<&str>,
        drop_target: Option<&str>,
    ) -> Option<PendingWrite> {
        let mut state = self.state();
        let outcome = state
            .board
            .apply_drop(task_id, source_container, drop_target);
        state.begin_from(outcome)
    }

    /// Persist a pending write and settle the pending map.
    pub async fn complete(&self, write: PendingWrite) -> SyncOutcome {
        let result = match write.kind {
            WriteKind::Status => {
                self.repo
                    .update_status(&write.task.id, &write.task.status)
                    .await
            }
            WriteKind::Full => self.repo.save_task(&write.task).await,
        };
        self.state().settle(write, result)
    }

    /// Move a task and wait for persistence.
    pub async fn move_task(&self, task_id: &str, from: &str, to: &str) -> SyncOutcome {
        match self.begin_move(task_id, from, to) {
            Some(write) => self.complete(write).await,
            None => SyncOutcome::Unchanged,
        }
    }

    /// Handle a drop and wait for persistence.
    pub async fn apply_drop(
        &self,
        task_id: &str,
        source_container: Option<&str>,
        drop_target: Option<&str>,
    ) -> SyncOutcome {
        match self.begin_drop(task_id, source_container, drop_target) {
            Some(write) => self.complete(write).await,
            None => SyncOutcome::Unchanged,
        }
    }

    /// Apply a move now and persist it in the background.
    /// Returns whether the board changed.
    pub fn spawn_move(self: &Arc<Self>, task_id: &str, from: &str, to: &str) -> bool {
        let Some(write) = self.begin_move(task_id, from, to) else {
            return false;
        };
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            manager.complete(write).await;
        });
        true
    }

    /// Create a ticket in the store, then show it on the board.
    pub async fn create_ticket(&self, ticket: NewTicket) -> BoardResult<Task> {
        let task = build_ticket(ticket, &self.config)?;
        self.repo.create_task(&task).await?;
        self.state().board.insert_task(task.clone());
        info!(task_id = %task.id, status = %task.status, "Created ticket");
        Ok(task)
    }

    /// Open an editor on a task currently on the board.
    pub fn open_editor(&self, task_id: &str) -> BoardResult<TaskEditor> {
        TaskEditor::open(&self.state().board, task_id, self.config.phase_policy)
    }

    /// Commit an editor to the board and persist the full task.
    pub async fn save(&self, editor: TaskEditor) -> BoardResult<SyncOutcome> {
        if !editor.is_dirty() {
            return Ok(SyncOutcome::Unchanged);
        }
        let write = {
            let mut state = self.state();
            let (task, before) = editor.save(&mut state.board)?;
            state.register(before, task, WriteKind::Full)
        };
        Ok(self.complete(write).await)
    }

    /// Like [`save`](Self::save), but surfaces a failed write as an error.
    pub async fn save_checked(&self, editor: TaskEditor) -> BoardResult<Task> {
        let task_id = editor.task_id().to_string();
        match self.save(editor).await? {
            SyncOutcome::RolledBack { error } | SyncOutcome::Superseded { error } => {
                Err(BoardError::from(error))
            }
            SyncOutcome::Unchanged | SyncOutcome::Persisted => self
                .task(&task_id)
                .ok_or_else(|| BoardError::task_not_found(&task_id)),
        }
    }
}
