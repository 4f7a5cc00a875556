//! taskboard
//!
//! Kanban task store API and board CLI.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use taskboard::cli::{Cli, Command, board};
use taskboard::config::{Config, ConfigLoader, ConfigPaths};
use taskboard::dashboard;
use taskboard::db::Database;
use taskboard::logging::{self, LogTarget};
use tracing::{debug, info};

fn load_config(cli: &Cli) -> Result<Config> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::load_file(PathBuf::from(path), ConfigPaths::discover())?,
        None => ConfigLoader::load()?,
    };
    for (tier, path) in loader.sources() {
        debug!(tier = %tier, path = %path.display(), "Loaded config");
    }

    let mut config = loader.into_config();
    if let Some(ref db_path) = cli.database {
        config.server.db_path = PathBuf::from(db_path);
    }
    if let Some(backend) = cli.backend {
        config.store.backend = backend.into();
    }
    Ok(config)
}

async fn serve(config: Config) -> Result<()> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path)?;
    info!(path = %config.server.db_path.display(), "Opened task database");

    let (shutdown_tx, addr) =
        dashboard::start_server(db, &config.server, config.board.clone()).await?;
    info!("Serving board API at http://{}/api", addr);

    tokio::signal::ctrl_c().await?;
    let _ = shutdown_tx.send(());
    info!("Shutdown requested");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut config = load_config(&cli)?;

    match cli.command {
        None => serve(config).await,
        Some(Command::Serve { port }) => {
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Some(command) => board::run(command, &config).await,
    }
}
