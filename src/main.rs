#![allow(dead_code)]

mod cli;
mod application;
mod domain;
mod data;
mod infra;

use anyhow::{Context, Result};
use cli::Cli;
use clap::Parser;
use std::{fs, path::Path, sync::Mutex};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_file.as_deref())?;
    cli.run()
}

/// RUST_LOG wins when set; otherwise `corpus_prep=<level>`.
fn init_tracing(level: &str, log_file: Option<&str>) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("corpus_prep={level}"))
            .with_context(|| format!("Invalid log level '{level}'"))?,
    };

    match log_file {
        Some(path) => {
            let path = Path::new(path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Cannot create log directory '{}'", parent.display()))?;
            }
            let file = fs::File::create(path)
                .with_context(|| format!("Cannot create log file '{}'", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
