//! # framebot: game-window automation
//!
//! Composition root that wires the adapters together behind a command line.
//!
//! ## Responsibilities
//! - Parse command-line arguments and configuration (file + env vars)
//! - Install the tracing subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Build the desktop (replayed window + filesystem templates)
//! - Dispatch to the requested command
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod commands;
mod config;
mod logging;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use framebot_domain::run::RunEvent;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "framebot", version, about = "Drive a game window with image-matched clicks")]
struct Cli {
    /// Configuration file (defaults to ./framebot.toml when present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List stored jobs.
    List,
    /// Run a job, by name or id.
    Run {
        job: String,
        /// Move the pointer for percentage clicks without pressing.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print which configured screen the job's window is showing.
    Identify { job: String },
    /// Write all jobs to a JSON file.
    Export { file: PathBuf },
    /// Add the jobs from a JSON export.
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    let _guard = logging::init(&config.logging)?;

    let db = framebot_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .with_context(|| format!("failed to open {}", config.database_url()))?;
    let store = db.job_store();

    match cli.command {
        Command::List => {
            for (job, tasks) in commands::list(store).await? {
                println!("{}\t{}\t{}\t{tasks} tasks", job.id, job.name, job.window_title);
            }
        }
        Command::Run { job, dry_run } => {
            let report = commands::run(&config, store, &job, dry_run, print_event).await?;
            println!(
                "{} finished: {} operations executed",
                report.job_name,
                report.executed_operations()
            );
        }
        Command::Identify { job } => match commands::identify(&config, store, &job).await? {
            Some(screen) => println!("{screen}"),
            None => println!("unknown screen"),
        },
        Command::Export { file } => {
            let count = commands::export(store, &file).await?;
            println!("exported {count} jobs to {}", file.display());
        }
        Command::Import { file } => {
            for job in commands::import(store, &file).await? {
                println!("imported {} as {}", job.name, job.id);
            }
        }
    }

    Ok(())
}

fn print_event(event: &RunEvent) {
    match event {
        RunEvent::Started { run_id, job_name, .. } => println!("run {run_id}: {job_name}"),
        RunEvent::TaskChanged { name, state, .. } => println!("  task {name}: {state}"),
        RunEvent::OperationChanged { name, state, .. } => println!("    {name}: {state}"),
        RunEvent::Succeeded { .. } => println!("run succeeded"),
        RunEvent::Failed { error, .. } => println!("run failed: {error}"),
    }
}
