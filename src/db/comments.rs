//! Append-only comment threads.

use super::{Database, now_ms};
use crate::types::{Comment, new_id};
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

impl Database {
    /// Append a comment to a task. Returns `None` if the task does not exist.
    /// Blank content is the caller's concern.
    pub fn add_comment(
        &self,
        task_id: &str,
        author: &str,
        content: &str,
    ) -> Result<Option<Comment>> {
        let comment = Comment {
            id: new_id(),
            author: author.to_string(),
            content: content.to_string(),
            created_at: now_ms(),
        };

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists = tx
                .query_row("SELECT 1 FROM tasks WHERE id = ?1", params![task_id], |_| Ok(()))
                .optional()?
                .is_some();
            if !exists {
                return Ok(None);
            }

            let next_index: i64 = tx.query_row(
                "SELECT COALESCE(MAX(order_index) + 1, 0) FROM task_comments WHERE task_id = ?1",
                params![task_id],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO task_comments (id, task_id, order_index, author, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    comment.id,
                    task_id,
                    next_index,
                    comment.author,
                    comment.content,
                    comment.created_at,
                ],
            )?;
            tx.execute(
                "UPDATE tasks SET updated_at = ?1 WHERE id = ?2",
                params![comment.created_at, task_id],
            )?;

            tx.commit()?;
            Ok(Some(comment))
        })
    }

    /// Comments for a task, oldest first.
    pub fn get_comments(&self, task_id: &str) -> Result<Vec<Comment>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, author, content, created_at
                 FROM task_comments WHERE task_id = ?1 ORDER BY order_index",
            )?;
            let comments = stmt
                .query_map(params![task_id], |row| {
                    Ok(Comment {
                        id: row.get(0)?,
                        author: row.get(1)?,
                        content: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(comments)
        })
    }
}
