//! Board partition: tasks grouped into columns by status.
//!
//! `Board` is a plain synchronous structure. Persistence and rollback live
//! in [`super::manager::BoardManager`].

use super::columns::ColumnSet;
use crate::types::Task;
use serde::Serialize;
use tracing::warn;

/// A derived lane holding the tasks whose status equals its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub id: String,
    pub title: String,
    pub tasks: Vec<Task>,
}

/// Result of [`Board::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LoadSummary {
    pub placed: usize,
    pub unplaced: usize,
}

/// Where a task currently sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLocation {
    pub column_id: String,
    pub index: usize,
}

/// A task together with the position it held, for rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub task: Task,
    pub location: Option<TaskLocation>,
}

/// A move that changed the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub task_id: String,
    pub from: String,
    pub to: String,
    /// State before the move.
    pub before: TaskSnapshot,
}

/// Why a move request left the board untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMoveReason {
    SameColumn,
    UnknownColumn,
    TaskNotInSource,
    MissingDropTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved(MoveRecord),
    Unchanged(NoMoveReason),
}

impl MoveOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, MoveOutcome::Moved(_))
    }
}

/// Per-column counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSummary {
    pub columns: Vec<(String, usize)>,
    pub unplaced: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct Board {
    set: ColumnSet,
    columns: Vec<Column>,
    unplaced: Vec<Task>,
}

impl Board {
    /// An empty board with one lane per column definition.
    pub fn new(set: ColumnSet) -> Self {
        let columns = set
            .iter()
            .map(|def| Column {
                id: def.id.clone(),
                title: def.title.clone(),
                tasks: Vec::new(),
            })
            .collect();
        Self {
            set,
            columns,
            unplaced: Vec::new(),
        }
    }

    pub fn column_set(&self) -> &ColumnSet {
        &self.set
    }

    /// Replace the whole partition with `tasks`, in input order.
    pub fn load(&mut self, tasks: Vec<Task>) -> LoadSummary {
        for column in &mut self.columns {
            column.tasks.clear();
        }
        self.unplaced.clear();

        let mut summary = LoadSummary::default();
        for task in tasks {
            match self.set.position(&task.status) {
                Some(pos) => {
                    self.columns[pos].tasks.push(task);
                    summary.placed += 1;
                }
                None => {
                    warn!(task_id = %task.id, status = %task.status, "Task has unknown status, not displayed");
                    self.unplaced.push(task);
                    summary.unplaced += 1;
                }
            }
        }
        summary
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    fn column_mut(&mut self, id: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == id)
    }

    /// Tasks whose status matched no column at load time.
    pub fn unplaced(&self) -> &[Task] {
        &self.unplaced
    }

    pub fn locate(&self, task_id: &str) -> Option<TaskLocation> {
        self.columns.iter().find_map(|column| {
            column
                .tasks
                .iter()
                .position(|t| t.id == task_id)
                .map(|index| TaskLocation {
                    column_id: column.id.clone(),
                    index,
                })
        })
    }

    /// Look up a placed task.
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.columns
            .iter()
            .flat_map(|c| c.tasks.iter())
            .find(|t| t.id == task_id)
    }

    /// Move a task between columns. The task is appended to `to` with its
    /// status rewritten.
    pub fn move_task(&mut self, task_id: &str, from: &str, to: &str) -> MoveOutcome {
        if from == to {
            return MoveOutcome::Unchanged(NoMoveReason::SameColumn);
        }
        if !self.set.contains(from) || !self.set.contains(to) {
            return MoveOutcome::Unchanged(NoMoveReason::UnknownColumn);
        }

        let Some(source) = self.column_mut(from) else {
            return MoveOutcome::Unchanged(NoMoveReason::UnknownColumn);
        };
        let Some(index) = source.tasks.iter().position(|t| t.id == task_id) else {
            return MoveOutcome::Unchanged(NoMoveReason::TaskNotInSource);
        };
        let mut task = source.tasks.remove(index);

        let before = TaskSnapshot {
            task: task.clone(),
            location: Some(TaskLocation {
                column_id: from.to_string(),
                index,
            }),
        };

        task.status = to.to_string();
        if let Some(target) = self.column_mut(to) {
            target.tasks.push(task);
        }

        MoveOutcome::Moved(MoveRecord {
            task_id: task_id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            before,
        })
    }

    /// Apply a drag-and-drop gesture. The source is the dragged item's
    /// container at drop time.
    pub fn apply_drop(
        &mut self,
        task_id: &str,
        source_container: Option<&str>,
        drop_target: Option<&str>,
    ) -> MoveOutcome {
        let Some(target) = drop_target.filter(|t| !t.is_empty()) else {
            return MoveOutcome::Unchanged(NoMoveReason::MissingDropTarget);
        };
        let source = match source_container {
            Some(source) => source.to_string(),
            None => match self.locate(task_id) {
                Some(location) => location.column_id,
                None => return MoveOutcome::Unchanged(NoMoveReason::TaskNotInSource),
            },
        };
        self.move_task(task_id, &source, target)
    }

    /// Append a task to the end of its status column. Unknown statuses go to
    /// the unplaced list. Returns false if a task with the same id exists.
    pub fn insert_task(&mut self, task: Task) -> bool {
        if self.contains_task(&task.id) {
            return false;
        }
        match self.column_mut(&task.status) {
            Some(column) => column.tasks.push(task),
            None => {
                warn!(task_id = %task.id, status = %task.status, "Inserted task has unknown status");
                self.unplaced.push(task);
            }
        }
        true
    }

    fn contains_task(&self, task_id: &str) -> bool {
        self.task(task_id).is_some() || self.unplaced.iter().any(|t| t.id == task_id)
    }

    /// Remove a task from wherever it sits.
    fn take_task(&mut self, task_id: &str) -> Option<Task> {
        for column in &mut self.columns {
            if let Some(index) = column.tasks.iter().position(|t| t.id == task_id) {
                return Some(column.tasks.remove(index));
            }
        }
        let index = self.unplaced.iter().position(|t| t.id == task_id)?;
        Some(self.unplaced.remove(index))
    }

    /// Overwrite a task with a committed copy. Keeps its position unless the
    /// status changed, in which case it moves to the end of the new column.
    /// Returns the prior snapshot, or `None` if the task is not on the board.
    pub fn replace_task(&mut self, task: Task) -> Option<TaskSnapshot> {
        let location = self.locate(&task.id);
        let before = match location.clone() {
            Some(TaskLocation { column_id, index }) => {
                let column = self.column_mut(&column_id)?;
                let previous = column.tasks[index].clone();
                if previous.status == task.status {
                    column.tasks[index] = task;
                    return Some(TaskSnapshot {
                        task: previous,
                        location,
                    });
                }
                previous
            }
            None => self.unplaced.iter().find(|t| t.id == task.id)?.clone(),
        };

        self.take_task(&task.id);
        self.insert_task(task);
        Some(TaskSnapshot {
            task: before,
            location,
        })
    }

    /// Put a task back exactly where a snapshot says it was.
    pub fn restore(&mut self, snapshot: TaskSnapshot) {
        self.take_task(&snapshot.task.id);
        match snapshot.location {
            Some(location) => {
                let Some(column) = self.column_mut(&location.column_id) else {
                    self.unplaced.push(snapshot.task);
                    return;
                };
                let index = location.index.min(column.tasks.len());
                column.tasks.insert(index, snapshot.task);
            }
            None => {
                self.insert_task(snapshot.task);
            }
        }
    }

    /// Every placed task in column order, followed by unplaced tasks.
    pub fn tasks(&self) -> Vec<&Task> {
        self.columns
            .iter()
            .flat_map(|c| c.tasks.iter())
            .chain(self.unplaced.iter())
            .collect()
    }

    pub fn summary(&self) -> BoardSummary {
        let columns: Vec<(String, usize)> = self
            .columns
            .iter()
            .map(|c| (c.id.clone(), c.tasks.len()))
            .collect();
        let placed: usize = columns.iter().map(|(_, n)| n).sum();
        BoardSummary {
            columns,
            unplaced: self.unplaced.len(),
            total: placed + self.unplaced.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ColumnDef;

    fn board() -> Board {
        Board::new(
            ColumnSet::new(vec![
                ColumnDef::new("backlog", "Backlog"),
                ColumnDef::new("todo", "To Do"),
                ColumnDef::new("done", "Done"),
            ])
            .unwrap(),
        )
    }

    fn task(id: &str, status: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {}", id),
            description: String::new(),
            status: status.to_string(),
            assignees: vec![],
            comments: vec![],
            attachments: vec![],
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn restore_puts_task_back_at_original_index() {
        let mut board = board();
        board.load(vec![task("1", "backlog"), task("2", "backlog"), task("3", "backlog")]);

        let MoveOutcome::Moved(record) = board.move_task("2", "backlog", "todo") else {
            panic!("expected move");
        };
        board.restore(record.before);

        let ids: Vec<&str> = board
            .column("backlog")
            .unwrap()
            .tasks
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(board.column("todo").unwrap().tasks.is_empty());
        assert_eq!(board.task("2").unwrap().status, "backlog");
    }

    #[test]
    fn replace_task_keeps_position_when_status_unchanged() {
        let mut board = board();
        board.load(vec![task("1", "todo"), task("2", "todo")]);

        let mut edited = task("1", "todo");
        edited.title = "Renamed".to_string();
        board.replace_task(edited).unwrap();

        let column = board.column("todo").unwrap();
        assert_eq!(column.tasks[0].title, "Renamed");
        assert_eq!(column.tasks[1].id, "2");
    }

    #[test]
    fn replace_task_moves_to_end_of_new_column() {
        let mut board = board();
        board.load(vec![task("1", "backlog"), task("2", "done")]);

        board.replace_task(task("1", "done")).unwrap();

        assert!(board.column("backlog").unwrap().tasks.is_empty());
        let ids: Vec<&str> = board
            .column("done")
            .unwrap()
            .tasks
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn apply_drop_without_target_is_noop() {
        let mut board = board();
        board.load(vec![task("1", "backlog")]);

        let outcome = board.apply_drop("1", Some("backlog"), None);
        assert_eq!(outcome, MoveOutcome::Unchanged(NoMoveReason::MissingDropTarget));

        let outcome = board.apply_drop("1", None, Some("todo"));
        assert!(outcome.is_moved());
        assert_eq!(board.task("1").unwrap().status, "todo");
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut board = board();
        assert!(board.insert_task(task("1", "backlog")));
        assert!(!board.insert_task(task("1", "todo")));
        assert_eq!(board.summary().total, 1);
    }
}
