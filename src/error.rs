//! Structured error types for board operations and API responses.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (4xx-like)
    MissingRequiredField,
    InvalidFieldValue,
    InvalidColumnSet,
    UnknownColumn,
    PhaseLimit,
    PhaseNotAllowed,

    // Not found errors
    TaskNotFound,

    // Conflict errors
    AlreadyExists,

    // Internal errors
    StoreError,
    InternalError,
}

/// Structured error for board operations.
#[derive(Debug, Clone, Serialize)]
pub struct BoardError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl BoardError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn invalid_column_set(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidColumnSet, reason)
    }

    pub fn unknown_column(column_id: &str) -> Self {
        Self::new(
            ErrorCode::UnknownColumn,
            format!("Unknown column: {}", column_id),
        )
        .with_field("status")
    }

    pub fn phase_limit(column_id: &str) -> Self {
        Self::new(
            ErrorCode::PhaseLimit,
            format!("Task is already in the last column ({})", column_id),
        )
    }

    pub fn phase_not_allowed(from: &str, to: &str) -> Self {
        Self::new(
            ErrorCode::PhaseNotAllowed,
            format!("Cannot move from {} to {}: only the next phase is allowed", from, to),
        )
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn already_exists(task_id: &str) -> Self {
        Self::new(
            ErrorCode::AlreadyExists,
            format!("Task already exists: {}", task_id),
        )
    }

    pub fn store(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::StoreError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BoardError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for BoardError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<BoardError>() {
            Ok(board_err) => board_err,
            Err(err) => BoardError::internal(err),
        }
    }
}

impl From<crate::store::StoreError> for BoardError {
    fn from(err: crate::store::StoreError) -> Self {
        use crate::store::StoreError;
        match err {
            StoreError::NotFound { id } => BoardError::task_not_found(&id),
            StoreError::Conflict { id } => BoardError::already_exists(&id),
            other => BoardError::store(other),
        }
    }
}

/// Result type for board operations.
pub type BoardResult<T> = std::result::Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_serializes_code_in_screaming_snake_case() {
        let err = BoardError::unknown_column("archived");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "UNKNOWN_COLUMN");
        assert_eq!(json["field"], "status");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn anyhow_roundtrip_preserves_board_error() {
        let err: anyhow::Error = BoardError::phase_limit("done").into();
        let back = BoardError::from(err);
        assert_eq!(back.code, ErrorCode::PhaseLimit);
    }

    #[test]
    fn plain_anyhow_becomes_internal() {
        let back = BoardError::from(anyhow::anyhow!("disk full"));
        assert_eq!(back.code, ErrorCode::InternalError);
        assert_eq!(back.to_string(), "disk full");
    }
}
