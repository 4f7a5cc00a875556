//! Kanban board: column model, partition state, task editor, and the
//! manager that persists board changes.

pub mod columns;
pub mod editor;
pub mod manager;
pub mod state;

pub use columns::{ColumnDef, ColumnSet, PhasePolicy};
pub use editor::TaskEditor;
pub use manager::{BoardManager, PendingWrite, SyncOutcome};
pub use state::{
    Board, BoardSummary, Column, LoadSummary, MoveOutcome, MoveRecord, NoMoveReason,
    TaskLocation, TaskSnapshot,
};
