//! Chat list storage.

use super::{Database, now_ms};
use crate::types::Chat;
use anyhow::Result;
use rusqlite::params;

impl Database {
    pub fn create_chat(&self, name: &str, is_group: bool) -> Result<Chat> {
        let now = now_ms();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chats (name, is_group, created_at) VALUES (?1, ?2, ?3)",
                params![name, is_group, now],
            )?;
            Ok(Chat {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                is_group,
                created_at: now,
            })
        })
    }

    /// All chats, newest first.
    pub fn list_chats(&self) -> Result<Vec<Chat>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, is_group, created_at FROM chats ORDER BY created_at DESC, id DESC",
            )?;
            let chats = stmt
                .query_map([], |row| {
                    Ok(Chat {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        is_group: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(chats)
        })
    }
}
