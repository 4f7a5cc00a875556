//! Task detail editor.
//!
//! Edits happen on a working copy; nothing reaches the board until
//! [`TaskEditor::save`] commits the whole field set.

use super::columns::{ColumnSet, PhasePolicy};
use super::state::{Board, TaskSnapshot};
use crate::db::now_ms;
use crate::error::{BoardError, BoardResult};
use crate::types::{Comment, Task, new_id};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TaskEditor {
    original: Task,
    working: Task,
    columns: ColumnSet,
    policy: PhasePolicy,
}

impl TaskEditor {
    /// Open an editor on a copy of the board's task.
    pub fn open(board: &Board, task_id: &str, policy: PhasePolicy) -> BoardResult<Self> {
        let task = board
            .task(task_id)
            .ok_or_else(|| BoardError::task_not_found(task_id))?
            .clone();
        Ok(Self {
            original: task.clone(),
            working: task,
            columns: board.column_set().clone(),
            policy,
        })
    }

    pub fn task_id(&self) -> &str {
        &self.working.id
    }

    pub fn working_copy(&self) -> &Task {
        &self.working
    }

    pub fn is_dirty(&self) -> bool {
        self.working != self.original
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> BoardResult<()> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(BoardError::missing_field("title"));
        }
        self.working.title = title;
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.working.description = description.into();
    }

    pub fn set_assignees(&mut self, assignees: Vec<String>) {
        self.working.assignees = assignees;
    }

    /// Append a comment. Content that is blank after trimming is ignored.
    pub fn add_comment(&mut self, author: &str, content: &str) -> Option<&Comment> {
        if content.trim().is_empty() {
            return None;
        }
        self.working.comments.push(Comment {
            id: new_id(),
            author: author.to_string(),
            content: content.to_string(),
            created_at: now_ms(),
        });
        self.working.comments.last()
    }

    /// Append an attachment reference. The reference is not dereferenced.
    pub fn add_attachment(&mut self, reference: &str) -> bool {
        if reference.trim().is_empty() {
            return false;
        }
        self.working.attachments.push(reference.to_string());
        true
    }

    /// Move the working copy to the strictly next column.
    pub fn advance_phase(&mut self) -> BoardResult<&str> {
        let next = self
            .columns
            .next_after(&self.working.status)
            .ok_or_else(|| BoardError::phase_limit(&self.working.status))?;
        self.working.status = next.id.clone();
        Ok(&self.working.status)
    }

    /// Set the working copy's phase, subject to the phase policy.
    pub fn set_phase(&mut self, target: &str) -> BoardResult<()> {
        if !self.columns.contains(target) {
            return Err(BoardError::unknown_column(target));
        }
        if !self
            .columns
            .transition_allowed(self.policy, &self.working.status, target)
        {
            return Err(BoardError::phase_not_allowed(&self.working.status, target));
        }
        self.working.status = target.to_string();
        Ok(())
    }

    /// Commit the working copy into `board` and close the editor.
    pub fn save(self, board: &mut Board) -> BoardResult<(Task, TaskSnapshot)> {
        let mut task = self.working;
        if task != self.original {
            task.updated_at = now_ms();
        }
        let before = board
            .replace_task(task.clone())
            .ok_or_else(|| BoardError::task_not_found(&task.id))?;
        debug!(task_id = %task.id, status = %task.status, "Saved task from editor");
        Ok((task, before))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ColumnDef;
    use crate::error::ErrorCode;

    fn board_with(status: &str) -> Board {
        let mut board = Board::new(
            ColumnSet::new(vec![
                ColumnDef::new("backlog", "Backlog"),
                ColumnDef::new("todo", "To Do"),
                ColumnDef::new("done", "Done"),
            ])
            .unwrap(),
        );
        board.load(vec![Task {
            id: "t1".to_string(),
            title: "Write docs".to_string(),
            description: String::new(),
            status: status.to_string(),
            assignees: vec![],
            comments: vec![],
            attachments: vec![],
            created_at: 1,
            updated_at: 1,
        }]);
        board
    }

    #[test]
    fn edits_stay_local_until_save() {
        let mut board = board_with("backlog");
        let mut editor = TaskEditor::open(&board, "t1", PhasePolicy::Sequential).unwrap();
        editor.set_title("Write better docs").unwrap();
        editor.add_comment("ana", "started");
        assert!(editor.is_dirty());
        assert_eq!(board.task("t1").unwrap().title, "Write docs");

        editor.save(&mut board).unwrap();
        let task = board.task("t1").unwrap();
        assert_eq!(task.title, "Write better docs");
        assert_eq!(task.comments.len(), 1);
        assert_eq!(task.comments[0].author, "ana");
    }

    #[test]
    fn whitespace_comment_is_ignored() {
        let board = board_with("backlog");
        let mut editor = TaskEditor::open(&board, "t1", PhasePolicy::Sequential).unwrap();
        assert!(editor.add_comment("ana", "   \n\t").is_none());
        assert!(editor.working_copy().comments.is_empty());
        assert!(!editor.is_dirty());
    }

    #[test]
    fn advance_rejected_at_last_column() {
        let board = board_with("done");
        let mut editor = TaskEditor::open(&board, "t1", PhasePolicy::Sequential).unwrap();
        let err = editor.advance_phase().unwrap_err();
        assert_eq!(err.code, ErrorCode::PhaseLimit);
        assert_eq!(editor.working_copy().status, "done");
    }

    #[test]
    fn sequential_policy_rejects_skipping() {
        let board = board_with("backlog");
        let mut editor = TaskEditor::open(&board, "t1", PhasePolicy::Sequential).unwrap();
        let err = editor.set_phase("done").unwrap_err();
        assert_eq!(err.code, ErrorCode::PhaseNotAllowed);
        editor.set_phase("todo").unwrap();

        let mut free = TaskEditor::open(&board, "t1", PhasePolicy::Free).unwrap();
        free.set_phase("done").unwrap();
        assert_eq!(free.set_phase("archived").unwrap_err().code, ErrorCode::UnknownColumn);
    }

    #[test]
    fn blank_title_rejected() {
        let board = board_with("backlog");
        let mut editor = TaskEditor::open(&board, "t1", PhasePolicy::Free).unwrap();
        assert_eq!(
            editor.set_title("  ").unwrap_err().code,
            ErrorCode::MissingRequiredField
        );
    }
}
