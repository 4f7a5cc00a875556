use super::{StoreError, StoreResult, TaskRepository};
use crate::types::Task;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Repository that talks to a running task store API.
#[derive(Clone)]
pub struct RemoteRepository {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct CreateBody<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    status: &'a str,
    assignees: &'a [String],
}

#[derive(Serialize)]
struct StatusBody<'a> {
    status: &'a str,
}

impl RemoteRepository {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn task_url(&self, id: &str) -> String {
        self.url(&format!("/tasks/{}", urlencoding::encode(id)))
    }
}

/// Map a non-success response to a store error.
async fn check(resp: Response, id: &str) -> StoreResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    match status {
        StatusCode::NOT_FOUND => Err(StoreError::NotFound { id: id.to_string() }),
        StatusCode::CONFLICT => Err(StoreError::Conflict { id: id.to_string() }),
        _ => {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl TaskRepository for RemoteRepository {
    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        let resp = self.client.get(self.url("/tasks")).send().await?;
        let resp = check(resp, "").await?;
        Ok(resp.json().await?)
    }

    async fn get_task(&self, id: &str) -> StoreResult<Option<Task>> {
        let resp = self.client.get(self.task_url(id)).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = check(resp, id).await?;
        Ok(Some(resp.json().await?))
    }

    async fn create_task(&self, task: &Task) -> StoreResult<()> {
        let body = CreateBody {
            id: &task.id,
            title: &task.title,
            description: &task.description,
            status: &task.status,
            assignees: &task.assignees,
        };
        let resp = self.client.post(self.url("/tasks")).json(&body).send().await?;
        check(resp, &task.id).await?;

        // Comments and attachments travel with a full save.
        if !task.comments.is_empty() || !task.attachments.is_empty() {
            self.save_task(task).await?;
        }
        Ok(())
    }

    async fn update_status(&self, id: &str, status: &str) -> StoreResult<()> {
        let resp = self
            .client
            .patch(self.task_url(id))
            .json(&StatusBody { status })
            .send()
            .await?;
        check(resp, id).await?;
        Ok(())
    }

    async fn save_task(&self, task: &Task) -> StoreResult<()> {
        let resp = self
            .client
            .put(self.task_url(&task.id))
            .json(task)
            .send()
            .await?;
        check(resp, &task.id).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "remote"
    }
}
