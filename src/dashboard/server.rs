//! HTTP server implementation for the task store API.
//!
//! This module provides the axum-based HTTP server that exposes the task
//! store, the column model and the partitioned board as JSON endpoints.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::board::{Board, BoardSummary, Column, ColumnDef, ColumnSet};
use crate::config::{BoardConfig, ServerConfig};
use crate::db::Database;
use crate::error::{BoardError, BoardResult, ErrorCode};
use crate::store::build_ticket;
use crate::types::{Chat, Comment, NewTicket, Task, TicketLane};

/// API server state shared across handlers.
#[derive(Clone)]
pub struct DashboardServer {
    /// Reference to the task database.
    db: Database,
    /// Board layout used for validation and the board view.
    board: Arc<BoardConfig>,
    columns: Arc<ColumnSet>,
}

impl DashboardServer {
    /// Create a new server state. Fails if the board configuration is invalid.
    pub fn new(db: Database, board: BoardConfig) -> BoardResult<Self> {
        let columns = board.column_set()?;
        Ok(Self {
            db,
            board: Arc::new(board),
            columns: Arc::new(columns),
        })
    }

    /// Get the database reference.
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn board_config(&self) -> &BoardConfig {
        &self.board
    }

    fn require_column(&self, status: &str) -> BoardResult<()> {
        if self.columns.contains(status) {
            Ok(())
        } else {
            let valid: Vec<&str> = self.columns.ids().collect();
            Err(BoardError::unknown_column(status)
                .with_details(format!("valid columns: {}", valid.join(", "))))
        }
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        let status = match self.code {
            ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFieldValue
            | ErrorCode::InvalidColumnSet
            | ErrorCode::UnknownColumn
            | ErrorCode::PhaseLimit
            | ErrorCode::PhaseNotAllowed => StatusCode::BAD_REQUEST,
            ErrorCode::TaskNotFound => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyExists => StatusCode::CONFLICT,
            ErrorCode::StoreError | ErrorCode::InternalError => {
                warn!(code = ?self.code, error = %self.message, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(self)).into_response()
    }
}

type ApiResult<T> = Result<T, BoardError>;

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn api_columns(State(state): State<DashboardServer>) -> Json<Vec<ColumnDef>> {
    Json(state.columns.iter().cloned().collect())
}

async fn api_tasks_list(State(state): State<DashboardServer>) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.db().call(|db| db.list_tasks()).await?;
    Ok(Json(tasks))
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lane: TicketLane,
    #[serde(default)]
    pub assignees: Vec<String>,
    /// Explicit starting column; overrides the lane.
    #[serde(default)]
    pub status: Option<String>,
}

async fn api_tasks_create(
    State(state): State<DashboardServer>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let mut task = build_ticket(
        NewTicket {
            id: req.id,
            title: req.title,
            description: req.description,
            lane: req.lane,
            assignees: req.assignees,
        },
        state.board_config(),
    )?;
    if let Some(status) = req.status {
        state.require_column(&status)?;
        task.status = status;
    }

    let created = {
        let task = task.clone();
        state.db().call(move |db| db.create_task(&task)).await?
    };
    if !created {
        return Err(BoardError::already_exists(&task.id));
    }

    info!(task_id = %task.id, status = %task.status, "Created task");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn load_task(state: &DashboardServer, task_id: String) -> ApiResult<Task> {
    let lookup = task_id.clone();
    state
        .db()
        .call(move |db| db.get_task(&lookup))
        .await?
        .ok_or_else(|| BoardError::task_not_found(&task_id))
}

async fn api_task_get(
    State(state): State<DashboardServer>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Task>> {
    Ok(Json(load_task(&state, task_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

async fn api_task_update_status(
    State(state): State<DashboardServer>,
    Path(task_id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.require_column(&req.status)?;

    let updated = {
        let (task_id, status) = (task_id.clone(), req.status.clone());
        state
            .db()
            .call(move |db| db.update_status(&task_id, &status))
            .await?
    };
    if !updated {
        return Err(BoardError::task_not_found(&task_id));
    }

    info!(task_id = %task_id, status = %req.status, "Task status updated");
    Ok(Json(MessageResponse {
        message: format!("Task {} moved to {}", task_id, req.status),
    }))
}

/// Full task body for a save. The id comes from the path.
#[derive(Debug, Deserialize)]
pub struct SaveTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

async fn api_task_save(
    State(state): State<DashboardServer>,
    Path(task_id): Path<String>,
    Json(req): Json<SaveTaskRequest>,
) -> ApiResult<Json<Task>> {
    if req.title.trim().is_empty() {
        return Err(BoardError::missing_field("title"));
    }
    state.require_column(&req.status)?;

    let task = Task {
        id: task_id.clone(),
        title: req.title,
        description: req.description,
        status: req.status,
        assignees: req.assignees,
        comments: req.comments,
        attachments: req.attachments,
        created_at: 0,
        updated_at: 0,
    };
    let saved = state.db().call(move |db| db.save_task(&task)).await?;
    if !saved {
        return Err(BoardError::task_not_found(&task_id));
    }
    Ok(Json(load_task(&state, task_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
}

async fn api_task_add_comment(
    State(state): State<DashboardServer>,
    Path(task_id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    if req.author.trim().is_empty() {
        return Err(BoardError::missing_field("author"));
    }
    if req.content.trim().is_empty() {
        return Err(BoardError::missing_field("content"));
    }

    let lookup = task_id.clone();
    let comment = state
        .db()
        .call(move |db| db.add_comment(&lookup, &req.author, &req.content))
        .await?
        .ok_or_else(|| BoardError::task_not_found(&task_id))?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[derive(Debug, Deserialize)]
pub struct AttachmentRequest {
    #[serde(default)]
    pub reference: String,
}

async fn api_task_add_attachment(
    State(state): State<DashboardServer>,
    Path(task_id): Path<String>,
    Json(req): Json<AttachmentRequest>,
) -> ApiResult<Json<Task>> {
    if req.reference.trim().is_empty() {
        return Err(BoardError::missing_field("reference"));
    }

    let added = {
        let task_id = task_id.clone();
        state
            .db()
            .call(move |db| db.add_attachment(&task_id, &req.reference))
            .await?
    };
    if !added {
        return Err(BoardError::task_not_found(&task_id));
    }
    Ok(Json(load_task(&state, task_id).await?))
}

/// Partitioned board as served by `GET /api/board`.
#[derive(Debug, Serialize)]
pub struct BoardView {
    pub columns: Vec<Column>,
    pub unplaced: Vec<Task>,
    pub summary: BoardSummary,
}

impl From<&Board> for BoardView {
    fn from(board: &Board) -> Self {
        Self {
            columns: board.columns().to_vec(),
            unplaced: board.unplaced().to_vec(),
            summary: board.summary(),
        }
    }
}

async fn api_board(State(state): State<DashboardServer>) -> ApiResult<Json<BoardView>> {
    let tasks = state.db().call(|db| db.list_tasks()).await?;
    let mut board = Board::new((*state.columns).clone());
    board.load(tasks);
    Ok(Json(BoardView::from(&board)))
}

async fn api_chats_list(State(state): State<DashboardServer>) -> ApiResult<Json<Vec<Chat>>> {
    let chats = state.db().call(|db| db.list_chats()).await?;
    Ok(Json(chats))
}

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_group: bool,
}

async fn api_chats_create(
    State(state): State<DashboardServer>,
    Json(req): Json<CreateChatRequest>,
) -> ApiResult<(StatusCode, Json<Chat>)> {
    if req.name.trim().is_empty() {
        return Err(BoardError::missing_field("name"));
    }
    let chat = state
        .db()
        .call(move |db| db.create_chat(&req.name, req.is_group))
        .await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

/// Build the API router. Exposed for in-process tests.
pub fn build_router(state: DashboardServer) -> Router {
    // Configure CORS for browser clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/columns", get(api_columns))
        .route("/api/tasks", get(api_tasks_list).post(api_tasks_create))
        .route(
            "/api/tasks/{task_id}",
            get(api_task_get)
                .patch(api_task_update_status)
                .put(api_task_save),
        )
        .route(
            "/api/tasks/{task_id}/comments",
            axum::routing::post(api_task_add_comment),
        )
        .route(
            "/api/tasks/{task_id}/attachments",
            axum::routing::post(api_task_add_attachment),
        )
        .route("/api/board", get(api_board))
        .route("/api/chats", get(api_chats_list).post(api_chats_create))
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// Returns a oneshot sender that can be used to signal shutdown,
/// and the actual address the server is bound to.
pub async fn start_server(
    db: Database,
    server: &ServerConfig,
    board: BoardConfig,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let state = DashboardServer::new(db, board)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((server.host.as_str(), server.port)).await?;
    let bound_addr = listener.local_addr()?;

    info!("Task store API listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Task store API shutting down");
            })
            .await
        {
            tracing::error!("Task store API error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}
