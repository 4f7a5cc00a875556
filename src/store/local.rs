use super::{StoreError, StoreResult, TaskRepository};
use crate::db::now_ms;
use crate::types::Task;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Repository holding the ticket list as a JSON array in a single file.
///
/// The file is re-read on every call and rewritten atomically on every write,
/// so edits made by other processes are picked up on the next list.
pub struct LocalRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> StoreResult<Vec<Task>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, tasks: &[Task]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(tasks)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), count = tasks.len(), "Wrote local ticket list");
        Ok(())
    }

    /// Read, apply `f` to the task with `id`, write back.
    async fn modify<F>(&self, id: &str, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Task) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.read_all().await?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        f(task);
        task.updated_at = now_ms();
        self.write_all(&tasks).await
    }
}

#[async_trait]
impl TaskRepository for LocalRepository {
    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        self.read_all().await
    }

    async fn get_task(&self, id: &str) -> StoreResult<Option<Task>> {
        Ok(self.read_all().await?.into_iter().find(|t| t.id == id))
    }

    async fn create_task(&self, task: &Task) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.read_all().await?;
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(StoreError::Conflict {
                id: task.id.clone(),
            });
        }
        tasks.push(task.clone());
        self.write_all(&tasks).await
    }

    async fn update_status(&self, id: &str, status: &str) -> StoreResult<()> {
        let status = status.to_string();
        self.modify(id, move |task| task.status = status).await
    }

    async fn save_task(&self, task: &Task) -> StoreResult<()> {
        let saved = task.clone();
        self.modify(&task.id, move |existing| {
            let created_at = existing.created_at;
            *existing = saved;
            existing.created_at = created_at;
        })
        .await
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}
