use super::{StoreError, StoreResult, TaskRepository};
use crate::db::Database;
use crate::types::Task;
use async_trait::async_trait;

/// Repository backed by the local SQLite database.
#[derive(Clone)]
pub struct SqliteRepository {
    db: Database,
}

impl SqliteRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepository for SqliteRepository {
    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        Ok(self.db.call(|db| db.list_tasks()).await?)
    }

    async fn get_task(&self, id: &str) -> StoreResult<Option<Task>> {
        let id = id.to_string();
        Ok(self.db.call(move |db| db.get_task(&id)).await?)
    }

    async fn create_task(&self, task: &Task) -> StoreResult<()> {
        let owned = task.clone();
        let created = self.db.call(move |db| db.create_task(&owned)).await?;
        if !created {
            return Err(StoreError::Conflict {
                id: task.id.clone(),
            });
        }
        Ok(())
    }

    async fn update_status(&self, id: &str, status: &str) -> StoreResult<()> {
        let (task_id, status) = (id.to_string(), status.to_string());
        let updated = self
            .db
            .call(move |db| db.update_status(&task_id, &status))
            .await?;
        if !updated {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn save_task(&self, task: &Task) -> StoreResult<()> {
        let owned = task.clone();
        let saved = self.db.call(move |db| db.save_task(&owned)).await?;
        if !saved {
            return Err(StoreError::NotFound {
                id: task.id.clone(),
            });
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
