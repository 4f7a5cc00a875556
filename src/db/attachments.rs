//! Attachment reference storage.

use super::{Database, now_ms};
use crate::types::AttachmentRef;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

impl Database {
    /// Append an attachment reference. Returns false if the task does not exist.
    pub fn add_attachment(&self, task_id: &str, reference: &str) -> Result<bool> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            // Verify task exists
            let exists = tx
                .query_row("SELECT 1 FROM tasks WHERE id = ?1", params![task_id], |_| Ok(()))
                .optional()?
                .is_some();
            if !exists {
                return Ok(false);
            }

            let next_index: i64 = tx.query_row(
                "SELECT COALESCE(MAX(order_index) + 1, 0) FROM task_attachments WHERE task_id = ?1",
                params![task_id],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO task_attachments (task_id, order_index, reference, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![task_id, next_index, reference, now],
            )?;
            tx.execute(
                "UPDATE tasks SET updated_at = ?1 WHERE id = ?2",
                params![now, task_id],
            )?;

            tx.commit()?;
            Ok(true)
        })
    }

    /// Attachment references for a task, in insertion order.
    pub fn get_attachments(&self, task_id: &str) -> Result<Vec<AttachmentRef>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT reference FROM task_attachments WHERE task_id = ?1 ORDER BY order_index",
            )?;
            let refs = stmt
                .query_map(params![task_id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(refs)
        })
    }
}
