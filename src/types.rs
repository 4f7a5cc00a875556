//! Core types for the task board.

use serde::{Deserialize, Serialize};

/// Opaque attachment reference (URL or blob handle). Never dereferenced here.
pub type AttachmentRef = String;

/// A comment on a task. Comments are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub content: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// A task on the board.
///
/// `status` is the id of the column the task belongs to. The store keeps the
/// canonical copy; the board and editors hold clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: String,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Which intake lane a new ticket lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketLane {
    /// Created from inside the dashboard; lands in the initial column.
    #[default]
    Internal,
    /// Submitted through the external ticket form.
    External,
}

/// Input for creating a ticket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTicket {
    /// Custom task ID (optional, UUID7 generated if not provided).
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lane: TicketLane,
    #[serde(default)]
    pub assignees: Vec<String>,
}

/// A chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub name: String,
    pub is_group: bool,
    pub created_at: i64,
}

/// Generate a new time-ordered identifier for tasks and comments.
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_deserializes_with_missing_collections() {
        let json = r#"{"id":"1","title":"Fix login","status":"backlog"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.description, "");
        assert!(task.assignees.is_empty());
        assert!(task.comments.is_empty());
        assert!(task.attachments.is_empty());
    }

    #[test]
    fn ticket_lane_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TicketLane::External).unwrap(),
            "\"external\""
        );
        let ticket: NewTicket = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(ticket.lane, TicketLane::Internal);
    }

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }
}
