//! Repository backends and the board manager's persistence behavior.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use taskboard::board::{BoardManager, SyncOutcome};
use taskboard::config::{BoardConfig, ServerConfig};
use taskboard::dashboard::start_server;
use taskboard::db::Database;
use taskboard::error::ErrorCode;
use taskboard::store::{
    LocalRepository, RemoteRepository, SqliteRepository, StoreError, StoreResult,
    TaskRepository,
};
use taskboard::types::{NewTicket, Task, TicketLane};
use tempfile::TempDir;

fn task(id: &str, status: &str) -> Task {
    Task {
        id: id.to_string(),
        title: format!("Task {}", id),
        description: String::new(),
        status: status.to_string(),
        assignees: vec![],
        comments: vec![],
        attachments: vec![],
        created_at: 1,
        updated_at: 1,
    }
}

/// In-memory repository whose writes can be made to fail per task id.
#[derive(Default)]
struct FlakyRepository {
    tasks: Mutex<Vec<Task>>,
    failing: Mutex<HashSet<String>>,
    failing_status: Mutex<HashSet<String>>,
    fail_list: Mutex<bool>,
}

impl FlakyRepository {
    fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Self::default()
        }
    }

    fn fail_writes_for(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    fn fail_moves_into(&self, status: &str) {
        self.failing_status.lock().unwrap().insert(status.to_string());
    }

    fn stored(&self, id: &str) -> Option<Task> {
        self.tasks.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }

    fn check(&self, id: &str) -> StoreResult<()> {
        if self.failing.lock().unwrap().contains(id) {
            return Err(StoreError::Rejected {
                status: 503,
                message: "store unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for FlakyRepository {
    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        if *self.fail_list.lock().unwrap() {
            return Err(StoreError::Rejected {
                status: 500,
                message: "list failed".to_string(),
            });
        }
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn get_task(&self, id: &str) -> StoreResult<Option<Task>> {
        Ok(self.stored(id))
    }

    async fn create_task(&self, task: &Task) -> StoreResult<()> {
        self.check(&task.id)?;
        self.tasks.lock().unwrap().push(task.clone());
        Ok(())
    }

    async fn update_status(&self, id: &str, status: &str) -> StoreResult<()> {
        self.check(id)?;
        if self.failing_status.lock().unwrap().contains(status) {
            return Err(StoreError::Rejected {
                status: 503,
                message: format!("cannot move into {}", status),
            });
        }
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        task.status = status.to_string();
        Ok(())
    }

    async fn save_task(&self, task: &Task) -> StoreResult<()> {
        self.check(&task.id)?;
        let mut tasks = self.tasks.lock().unwrap();
        let existing = tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| StoreError::NotFound {
                id: task.id.clone(),
            })?;
        *existing = task.clone();
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "flaky"
    }
}

async fn manager_with(repo: Arc<FlakyRepository>) -> Arc<BoardManager> {
    let manager = BoardManager::new(BoardConfig::default(), repo).unwrap();
    manager.refresh().await.unwrap();
    Arc::new(manager)
}

mod manager_tests {
    use super::*;

    #[tokio::test]
    async fn successful_move_is_persisted() {
        let repo = Arc::new(FlakyRepository::with_tasks(vec![task("1", "backlog")]));
        let manager = manager_with(repo.clone()).await;

        let outcome = manager.move_task("1", "backlog", "todo").await;

        assert!(outcome.is_persisted());
        assert_eq!(repo.stored("1").unwrap().status, "todo");
        assert_eq!(manager.task("1").unwrap().status, "todo");
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test]
    async fn failed_move_rolls_back() {
        let repo = Arc::new(FlakyRepository::with_tasks(vec![
            task("1", "backlog"),
            task("2", "backlog"),
        ]));
        repo.fail_writes_for("1");
        let manager = manager_with(repo.clone()).await;

        let outcome = manager.move_task("1", "backlog", "todo").await;

        assert!(matches!(outcome, SyncOutcome::RolledBack { .. }));
        let board = manager.snapshot();
        let backlog: Vec<&str> = board
            .column("backlog")
            .unwrap()
            .tasks
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(backlog, vec!["1", "2"]);
        assert_eq!(board.task("1").unwrap().status, "backlog");
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test]
    async fn superseded_failure_does_not_roll_back() {
        let repo = Arc::new(FlakyRepository::with_tasks(vec![task("1", "backlog")]));
        repo.fail_writes_for("1");
        let manager = manager_with(repo.clone()).await;

        // Both moves applied before either write settles.
        let first = manager.begin_move("1", "backlog", "todo").unwrap();
        let second = manager.begin_move("1", "todo", "in-progress").unwrap();

        let outcome = manager.complete(first).await;
        assert!(matches!(outcome, SyncOutcome::Superseded { .. }));
        assert_eq!(manager.task("1").unwrap().status, "in-progress");

        let outcome = manager.complete(second).await;
        assert!(matches!(outcome, SyncOutcome::RolledBack { .. }));
        assert_eq!(manager.task("1").unwrap().status, "backlog");
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn rollback_racing_a_newer_move_keeps_board_and_store_aligned() {
        for _ in 0..200 {
            let repo = Arc::new(FlakyRepository::with_tasks(vec![task("1", "backlog")]));
            repo.fail_moves_into("todo");
            let manager = manager_with(repo.clone()).await;

            let first = manager.begin_move("1", "backlog", "todo").unwrap();
            let settling = {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.complete(first).await })
            };
            let second = manager.begin_move("1", "todo", "in-progress");
            settling.await.unwrap();
            if let Some(write) = second {
                assert!(manager.complete(write).await.is_persisted());
            }

            assert_eq!(
                manager.task("1").unwrap().status,
                repo.stored("1").unwrap().status
            );
            assert_eq!(manager.pending_count(), 0);
        }
    }

    #[tokio::test]
    async fn move_after_rollback_starts_from_restored_column() {
        let repo = Arc::new(FlakyRepository::with_tasks(vec![task("1", "backlog")]));
        repo.fail_moves_into("todo");
        let manager = manager_with(repo.clone()).await;

        let first = manager.begin_move("1", "backlog", "todo").unwrap();
        assert!(matches!(
            manager.complete(first).await,
            SyncOutcome::RolledBack { .. }
        ));

        assert!(manager.begin_move("1", "todo", "in-progress").is_none());
        assert_eq!(manager.task("1").unwrap().status, "backlog");
        assert_eq!(repo.stored("1").unwrap().status, "backlog");
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test]
    async fn noop_move_persists_nothing() {
        let repo = Arc::new(FlakyRepository::with_tasks(vec![task("1", "backlog")]));
        let manager = manager_with(repo.clone()).await;

        assert!(matches!(
            manager.move_task("1", "backlog", "backlog").await,
            SyncOutcome::Unchanged
        ));
        assert!(matches!(
            manager.apply_drop("1", Some("backlog"), None).await,
            SyncOutcome::Unchanged
        ));
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_prior_board() {
        let repo = Arc::new(FlakyRepository::with_tasks(vec![task("1", "todo")]));
        let manager = manager_with(repo.clone()).await;
        *repo.fail_list.lock().unwrap() = true;

        assert!(manager.refresh().await.is_err());
        assert_eq!(manager.task("1").unwrap().status, "todo");
    }

    #[tokio::test]
    async fn spawned_move_applies_immediately() {
        let repo = Arc::new(FlakyRepository::with_tasks(vec![task("1", "backlog")]));
        let manager = manager_with(repo.clone()).await;

        assert!(manager.spawn_move("1", "backlog", "todo"));
        // Local state changes before the write is awaited.
        assert_eq!(manager.task("1").unwrap().status, "todo");

        for _ in 0..50 {
            if manager.pending_count() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(manager.pending_count(), 0);
        assert_eq!(repo.stored("1").unwrap().status, "todo");
    }

    #[tokio::test]
    async fn editor_save_persists_full_task() {
        let repo = Arc::new(FlakyRepository::with_tasks(vec![task("1", "backlog")]));
        let manager = manager_with(repo.clone()).await;

        let mut editor = manager.open_editor("1").unwrap();
        editor.set_title("Fix the login page").unwrap();
        editor.add_comment("ana", "on it");
        editor.advance_phase().unwrap();

        let saved = manager.save_checked(editor).await.unwrap();

        assert_eq!(saved.status, "todo");
        let stored = repo.stored("1").unwrap();
        assert_eq!(stored.title, "Fix the login page");
        assert_eq!(stored.comments.len(), 1);
    }

    #[tokio::test]
    async fn failed_editor_save_restores_task() {
        let repo = Arc::new(FlakyRepository::with_tasks(vec![task("1", "backlog")]));
        repo.fail_writes_for("1");
        let manager = manager_with(repo.clone()).await;

        let mut editor = manager.open_editor("1").unwrap();
        editor.set_title("Never stored").unwrap();
        let err = manager.save_checked(editor).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::StoreError);
        assert_eq!(manager.task("1").unwrap().title, "Task 1");
    }

    #[tokio::test]
    async fn create_ticket_lands_in_intake_lane() {
        let repo = Arc::new(FlakyRepository::default());
        let manager = manager_with(repo.clone()).await;

        let task = manager
            .create_ticket(NewTicket {
                title: "Printer on fire".to_string(),
                lane: TicketLane::External,
                ..NewTicket::default()
            })
            .await
            .unwrap();

        assert_eq!(task.status, "external");
        assert!(repo.stored(&task.id).is_some());
        let board = manager.snapshot();
        assert_eq!(board.column("external").unwrap().tasks[0].id, task.id);
    }
}

mod local_tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_lists_empty() {
        let dir = TempDir::new().unwrap();
        let repo = LocalRepository::new(dir.path().join("tickets.json"));
        assert!(repo.list_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_appends_in_order_and_survives_new_handle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tickets.json");
        let repo = LocalRepository::new(&path);

        repo.create_task(&task("1", "backlog")).await.unwrap();
        repo.create_task(&task("2", "external")).await.unwrap();

        let reopened = LocalRepository::new(&path);
        let ids: Vec<String> = reopened
            .list_tasks()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let dir = TempDir::new().unwrap();
        let repo = LocalRepository::new(dir.path().join("tickets.json"));
        repo.create_task(&task("1", "backlog")).await.unwrap();

        let err = repo.create_task(&task("1", "todo")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn update_status_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let repo = LocalRepository::new(dir.path().join("tickets.json"));
        repo.create_task(&task("1", "backlog")).await.unwrap();

        repo.update_status("1", "done").await.unwrap();
        assert_eq!(repo.get_task("1").await.unwrap().unwrap().status, "done");

        let err = repo.update_status("ghost", "done").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn external_edits_are_picked_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.json");
        let repo = LocalRepository::new(&path);
        repo.create_task(&task("1", "backlog")).await.unwrap();

        let edited = serde_json::to_string(&vec![task("1", "todo"), task("2", "done")]).unwrap();
        std::fs::write(&path, edited).unwrap();

        assert_eq!(repo.list_tasks().await.unwrap().len(), 2);
    }
}

mod sqlite_tests {
    use super::*;

    #[tokio::test]
    async fn missing_task_errors_map_to_not_found() {
        let repo = SqliteRepository::new(Database::open_in_memory().unwrap());
        let err = repo.update_status("ghost", "todo").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        repo.create_task(&task("1", "todo")).await.unwrap();
        let err = repo.create_task(&task("1", "todo")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }
}

mod remote_tests {
    use super::*;

    async fn start() -> (tokio::sync::oneshot::Sender<()>, RemoteRepository) {
        let server = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        let (shutdown, addr) = start_server(
            Database::open_in_memory().unwrap(),
            &server,
            BoardConfig::default(),
        )
        .await
        .unwrap();
        let repo = RemoteRepository::new(&format!("http://{}", addr)).unwrap();
        (shutdown, repo)
    }

    #[tokio::test]
    async fn remote_round_trip() {
        let (shutdown, repo) = start().await;

        let mut t = task("r1", "backlog");
        t.attachments = vec!["blob:7".to_string()];
        repo.create_task(&t).await.unwrap();
        repo.update_status("r1", "todo").await.unwrap();

        let loaded = repo.get_task("r1").await.unwrap().unwrap();
        assert_eq!(loaded.status, "todo");
        assert_eq!(loaded.attachments, vec!["blob:7"]);
        assert_eq!(repo.list_tasks().await.unwrap().len(), 1);

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn remote_ids_with_reserved_characters() {
        let (shutdown, repo) = start().await;

        let id = "team a/42";
        repo.create_task(&task(id, "backlog")).await.unwrap();
        repo.update_status(id, "todo").await.unwrap();

        let loaded = repo.get_task(id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.status, "todo");
        assert!(repo.get_task("team a").await.unwrap().is_none());

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn remote_errors_are_mapped() {
        let (shutdown, repo) = start().await;

        assert!(repo.get_task("ghost").await.unwrap().is_none());
        let err = repo.update_status("ghost", "todo").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        repo.create_task(&task("r1", "backlog")).await.unwrap();
        let err = repo.update_status("r1", "archived").await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 400, .. }));
        let err = repo.create_task(&task("r1", "backlog")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn manager_over_remote_store() {
        let (shutdown, repo) = start().await;
        repo.create_task(&task("x", "backlog")).await.unwrap();

        let manager = BoardManager::new(BoardConfig::default(), Arc::new(repo.clone())).unwrap();
        manager.refresh().await.unwrap();
        assert!(manager.move_task("x", "backlog", "todo").await.is_persisted());

        assert_eq!(repo.get_task("x").await.unwrap().unwrap().status, "todo");
        let _ = shutdown.send(());
    }
}
