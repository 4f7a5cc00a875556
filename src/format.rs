//! Output formatting utilities for markdown and JSON.

use crate::board::{Board, ColumnSet};
use crate::types::Task;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    Markdown,
}

/// Format a single task as markdown.
pub fn format_task_markdown(task: &Task) -> String {
    let mut md = String::new();

    md.push_str(&format!("## Task: {}\n", task.title));
    md.push_str(&format!("- **id**: `{}`\n", task.id));
    md.push_str(&format!("- **status**: {}\n", task.status));

    if !task.assignees.is_empty() {
        md.push_str(&format!("- **assignees**: {}\n", task.assignees.join(", ")));
    }

    if !task.description.is_empty() {
        md.push_str("\n### Description\n");
        md.push_str(&task.description);
        md.push('\n');
    }

    if !task.attachments.is_empty() {
        md.push_str("\n### Attachments\n");
        for reference in &task.attachments {
            md.push_str(&format!("- {}\n", reference));
        }
    }

    if !task.comments.is_empty() {
        md.push_str(&format!("\n### Comments ({})\n", task.comments.len()));
        for comment in &task.comments {
            md.push_str(&format!("- **{}**: {}\n", comment.author, comment.content));
        }
    }

    md
}

/// Format the board as markdown, one section per column.
pub fn format_board_markdown(board: &Board) -> String {
    let summary = board.summary();
    let mut md = format!("# Board ({} tasks)\n", summary.total);

    for column in board.columns() {
        md.push_str(&format!("\n## {} ({})\n", column.title, column.tasks.len()));
        if column.tasks.is_empty() {
            md.push_str("_empty_\n");
        }
        for task in &column.tasks {
            let assignees = if task.assignees.is_empty() {
                String::new()
            } else {
                format!(" [{}]", task.assignees.join(", "))
            };
            md.push_str(&format!("- `{}` {}{}\n", task.id, task.title, assignees));
        }
    }

    if !board.unplaced().is_empty() {
        md.push_str(&format!("\n## Not displayed ({})\n", board.unplaced().len()));
        for task in board.unplaced() {
            md.push_str(&format!("- `{}` {} (status: {})\n", task.id, task.title, task.status));
        }
    }

    md
}

/// Format the column set as a markdown list.
pub fn format_columns_markdown(columns: &ColumnSet) -> String {
    let mut md = String::from("# Columns\n");
    for (index, column) in columns.iter().enumerate() {
        md.push_str(&format!("{}. `{}` {}\n", index + 1, column.id, column.title));
    }
    md
}
