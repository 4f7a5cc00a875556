//! Task store HTTP API module.
//!
//! Serves the JSON API used by the remote repository and by browser clients.
//! Started by `taskboard serve`.

mod server;

pub use server::{
    AttachmentRequest, BoardView, CommentRequest, CreateChatRequest, CreateTaskRequest,
    DashboardServer, StatusUpdateRequest, build_router, start_server,
};
