//! taskboard library
//!
//! This module exports the core components for testing and integration.

pub mod board;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod store;
pub mod types;
