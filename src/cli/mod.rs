//! CLI command definitions for taskboard.
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod board;

use crate::config::StoreBackend;
use crate::format::OutputFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Repository backend selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Sqlite,
    Local,
    Remote,
}

impl From<BackendArg> for StoreBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Sqlite => StoreBackend::Sqlite,
            BackendArg::Local => StoreBackend::Local,
            BackendArg::Remote => StoreBackend::Remote,
        }
    }
}

/// Kanban task store and board CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Repository backend for board commands (overrides config)
    #[arg(short, long, value_enum, global = true)]
    pub backend: Option<BackendArg>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the task store API (default if no subcommand given)
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show the board partitioned into columns
    Board(FormatArgs),

    /// List the configured columns in order
    Columns(FormatArgs),

    /// Create a ticket
    Create(CreateArgs),

    /// Move a task from one column to another
    Move {
        task: String,
        from: String,
        to: String,
    },

    /// Advance a task to the next column
    Advance { task: String },

    /// Add a comment to a task
    Comment {
        task: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        content: String,
    },
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Ticket title
    #[arg(long)]
    pub title: String,

    /// Ticket description
    #[arg(long, default_value = "")]
    pub description: String,

    /// File the ticket in the external intake lane
    #[arg(long)]
    pub external: bool,

    /// Assignee (repeatable)
    #[arg(long = "assignee")]
    pub assignees: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,
}
