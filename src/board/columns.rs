//! The fixed, ordered set of board lanes.

use crate::error::{BoardError, BoardResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A lane definition: stable id plus display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub id: String,
    pub title: String,
}

impl ColumnDef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// How the task editor is allowed to change a task's phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhasePolicy {
    /// Only the current column or the strictly next one.
    #[default]
    Sequential,
    /// Any known column.
    Free,
}

/// Validated column set: non-empty, unique ids, totally ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    columns: Vec<ColumnDef>,
}

impl ColumnSet {
    pub fn new(columns: Vec<ColumnDef>) -> BoardResult<Self> {
        if columns.is_empty() {
            return Err(BoardError::invalid_column_set(
                "column set must contain at least one column",
            ));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if column.id.trim().is_empty() {
                return Err(BoardError::invalid_column_set("column id must not be blank"));
            }
            if !seen.insert(column.id.as_str()) {
                return Err(BoardError::invalid_column_set(format!(
                    "duplicate column id: {}",
                    column.id
                )));
            }
        }

        Ok(Self { columns })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// The column after `id`, or `None` if `id` is last or unknown.
    pub fn next_after(&self, id: &str) -> Option<&ColumnDef> {
        let pos = self.position(id)?;
        self.columns.get(pos + 1)
    }

    pub fn first(&self) -> &ColumnDef {
        &self.columns[0]
    }

    pub fn last(&self) -> &ColumnDef {
        &self.columns[self.columns.len() - 1]
    }

    /// Whether `policy` allows a phase change from `from` to `to`.
    pub fn transition_allowed(&self, policy: PhasePolicy, from: &str, to: &str) -> bool {
        if !self.contains(to) {
            return false;
        }
        match policy {
            PhasePolicy::Free => true,
            PhasePolicy::Sequential => {
                from == to || self.next_after(from).is_some_and(|next| next.id == to)
            }
        }
    }
}
