//! Board subcommands: inspect the board and change tasks through the manager.

use super::{Command, CreateArgs};
use crate::board::{BoardManager, SyncOutcome};
use crate::config::Config;
use crate::dashboard::BoardView;
use crate::error::BoardError;
use crate::format::{
    OutputFormat, format_board_markdown, format_columns_markdown, format_task_markdown,
};
use crate::store::open_repository;
use crate::types::{NewTicket, Task, TicketLane};
use anyhow::{Result, bail};

/// Run a board subcommand. `Serve` is handled by the binary.
pub async fn run(command: Command, config: &Config) -> Result<()> {
    if let Command::Columns(args) = &command {
        let columns = config.board.column_set()?;
        match args.format {
            OutputFormat::Json => {
                let defs: Vec<_> = columns.iter().collect();
                println!("{}", serde_json::to_string_pretty(&defs)?);
            }
            OutputFormat::Markdown => print!("{}", format_columns_markdown(&columns)),
        }
        return Ok(());
    }

    let repo = open_repository(config)?;
    let manager = BoardManager::new(config.board.clone(), repo)?;

    match command {
        Command::Board(args) => {
            manager.refresh().await?;
            let board = manager.snapshot();
            match args.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&BoardView::from(&board))?)
                }
                OutputFormat::Markdown => print!("{}", format_board_markdown(&board)),
            }
        }
        Command::Create(args) => {
            manager.refresh().await?;
            let format = args.format;
            let task = manager.create_ticket(ticket_from_args(args)).await?;
            print_task(&task, format)?;
        }
        Command::Move { task, from, to } => {
            manager.refresh().await?;
            match manager.move_task(&task, &from, &to).await {
                SyncOutcome::Unchanged => {
                    bail!("Task {} is not in column {}, or the move is not valid", task, from)
                }
                SyncOutcome::Persisted => println!("Moved {} from {} to {}", task, from, to),
                SyncOutcome::RolledBack { error } | SyncOutcome::Superseded { error } => {
                    return Err(BoardError::from(error).into());
                }
            }
        }
        Command::Advance { task } => {
            manager.refresh().await?;
            let mut editor = manager.open_editor(&task)?;
            let next = editor.advance_phase()?.to_string();
            manager.save_checked(editor).await?;
            println!("Advanced {} to {}", task, next);
        }
        Command::Comment {
            task,
            author,
            content,
        } => {
            manager.refresh().await?;
            let mut editor = manager.open_editor(&task)?;
            if editor.add_comment(&author, &content).is_none() {
                return Err(BoardError::missing_field("content").into());
            }
            let saved = manager.save_checked(editor).await?;
            print_task(&saved, OutputFormat::Markdown)?;
        }
        Command::Serve { .. } | Command::Columns(_) => {}
    }
    Ok(())
}

fn ticket_from_args(args: CreateArgs) -> NewTicket {
    NewTicket {
        id: None,
        title: args.title,
        description: args.description,
        lane: if args.external {
            TicketLane::External
        } else {
            TicketLane::Internal
        },
        assignees: args.assignees,
    }
}

fn print_task(task: &Task, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(task)?),
        OutputFormat::Markdown => print!("{}", format_task_markdown(task)),
    }
    Ok(())
}
