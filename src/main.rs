use std::io;
use std::path::PathBuf;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod app;
mod command_loop;
mod config;
mod database;
mod date_parser;
mod error;
mod todo;

use crate::config::Configuration;
use crate::database::SqliteStore;

/// Interactive todo list backed by a SQLite database.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cmd {
    /// Database URL, overrides the configured one.
    #[arg(short, long, value_name = "URL")]
    database: Option<String>,
    /// Additional configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn init_tracing(cfg: &Configuration) -> color_eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cfg.log.filter)?)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cmd = Cmd::parse();

    let mut cfg = Configuration::load(cmd.config.as_deref())?;
    if let Some(url) = cmd.database {
        cfg.database.url = url;
    }
    init_tracing(&cfg)?;

    let store = match SqliteStore::connect(&cfg.database).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, url = %cfg.database.url, "could not connect");
            println!("Failed to connect to database. Try again later.");
            return Ok(());
        }
    };

    app::session(store, io::stdin().lock(), io::stdout().lock()).await;
    Ok(())
}
