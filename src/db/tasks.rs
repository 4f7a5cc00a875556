//! Task CRUD.

use super::{Database, now_ms};
use crate::types::{AttachmentRef, Comment, Task};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;

const TASK_COLUMNS: &str = "id, title, description, status, assignees, created_at, updated_at";

/// Parse a task row. Comments and attachments are filled in separately.
pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let assignees_json: String = row.get("assignees")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: row.get("status")?,
        assignees: serde_json::from_str(&assignees_json).unwrap_or_default(),
        comments: Vec::new(),
        attachments: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn task_exists(conn: &Connection, task_id: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM tasks WHERE id = ?1",
            params![task_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    Ok(exists)
}

/// Replace a task's comment thread with `comments`, preserving order.
fn sync_comments(conn: &Connection, task_id: &str, comments: &[Comment]) -> Result<()> {
    conn.execute(
        "DELETE FROM task_comments WHERE task_id = ?1",
        params![task_id],
    )?;
    for (index, comment) in comments.iter().enumerate() {
        conn.execute(
            "INSERT INTO task_comments (id, task_id, order_index, author, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                comment.id,
                task_id,
                index as i64,
                comment.author,
                comment.content,
                comment.created_at,
            ],
        )?;
    }
    Ok(())
}

/// Replace a task's attachment list with `attachments`, preserving order.
fn sync_attachments(
    conn: &Connection,
    task_id: &str,
    attachments: &[AttachmentRef],
    now: i64,
) -> Result<()> {
    conn.execute(
        "DELETE FROM task_attachments WHERE task_id = ?1",
        params![task_id],
    )?;
    for (index, reference) in attachments.iter().enumerate() {
        conn.execute(
            "INSERT INTO task_attachments (task_id, order_index, reference, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![task_id, index as i64, reference, now],
        )?;
    }
    Ok(())
}

/// Load comments for every task id in one pass, keyed by task id.
fn load_comment_map(conn: &Connection) -> Result<HashMap<String, Vec<Comment>>> {
    let mut stmt = conn.prepare(
        "SELECT task_id, id, author, content, created_at
         FROM task_comments ORDER BY task_id, order_index",
    )?;
    let mut map: HashMap<String, Vec<Comment>> = HashMap::new();
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            Comment {
                id: row.get(1)?,
                author: row.get(2)?,
                content: row.get(3)?,
                created_at: row.get(4)?,
            },
        ))
    })?;
    for row in rows {
        let (task_id, comment) = row?;
        map.entry(task_id).or_default().push(comment);
    }
    Ok(map)
}

fn load_attachment_map(conn: &Connection) -> Result<HashMap<String, Vec<AttachmentRef>>> {
    let mut stmt = conn.prepare(
        "SELECT task_id, reference FROM task_attachments ORDER BY task_id, order_index",
    )?;
    let mut map: HashMap<String, Vec<AttachmentRef>> = HashMap::new();
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (task_id, reference) = row?;
        map.entry(task_id).or_default().push(reference);
    }
    Ok(map)
}

impl Database {
    /// Insert a task with its comments and attachments.
    /// Returns false if a task with the same id already exists.
    pub fn create_task(&self, task: &Task) -> Result<bool> {
        let now = now_ms();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if task_exists(&tx, &task.id)? {
                return Ok(false);
            }

            let created_at = if task.created_at > 0 { task.created_at } else { now };
            let updated_at = if task.updated_at > 0 { task.updated_at } else { created_at };

            tx.execute(
                "INSERT INTO tasks (id, title, description, status, assignees, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    task.id,
                    task.title,
                    task.description,
                    task.status,
                    serde_json::to_string(&task.assignees)?,
                    created_at,
                    updated_at,
                ],
            )?;
            sync_comments(&tx, &task.id, &task.comments)?;
            sync_attachments(&tx, &task.id, &task.attachments, now)?;

            tx.commit()?;
            Ok(true)
        })
    }

    /// Get a task with its comments and attachments.
    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        let task = self.with_conn(|conn| {
            let task = conn
                .query_row(
                    &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                    params![task_id],
                    parse_task_row,
                )
                .optional()?;
            Ok(task)
        })?;

        let Some(mut task) = task else {
            return Ok(None);
        };
        task.comments = self.get_comments(task_id)?;
        task.attachments = self.get_attachments(task_id)?;
        Ok(Some(task))
    }

    /// List all tasks, newest first.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM tasks ORDER BY created_at DESC, rowid DESC",
                TASK_COLUMNS
            ))?;
            let mut tasks = stmt
                .query_map([], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut comments = load_comment_map(conn)?;
            let mut attachments = load_attachment_map(conn)?;
            for task in &mut tasks {
                task.comments = comments.remove(&task.id).unwrap_or_default();
                task.attachments = attachments.remove(&task.id).unwrap_or_default();
            }
            Ok(tasks)
        })
    }

    /// Set a task's status. Returns false if the task does not exist.
    pub fn update_status(&self, task_id: &str, status: &str) -> Result<bool> {
        let now = now_ms();
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status, now, task_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Overwrite every field of an existing task, including its comment thread
    /// and attachment list. Returns false if the task does not exist.
    pub fn save_task(&self, task: &Task) -> Result<bool> {
        let now = now_ms();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let changed = tx.execute(
                "UPDATE tasks SET title = ?1, description = ?2, status = ?3, assignees = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    task.title,
                    task.description,
                    task.status,
                    serde_json::to_string(&task.assignees)?,
                    now,
                    task.id,
                ],
            )?;
            if changed == 0 {
                return Ok(false);
            }

            sync_comments(&tx, &task.id, &task.comments)?;
            sync_attachments(&tx, &task.id, &task.attachments, now)?;

            tx.commit()?;
            Ok(true)
        })
    }
}
