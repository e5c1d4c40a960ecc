//! Command implementations.
//!
//! Each command takes the loaded configuration and the job store and
//! returns what it produced; printing is left to `main`.

use std::path::Path;

use anyhow::{Context, bail};
use tokio::sync::broadcast::error::RecvError;

use framebot_adapter_storage_sqlite_sqlx::SqliteJobStore;
use framebot_adapter_templates_fs::FsTemplateStore;
use framebot_adapter_virtual::VirtualDesktop;
use framebot_app::automation_engine::{AutomationEngine, Desktop};
use framebot_app::event_bus::InProcessEventBus;
use framebot_app::scheduler::RunScheduler;
use framebot_app::services::job_service::{JobBundle, JobService};
use framebot_domain::error::FramebotError;
use framebot_domain::geometry::Point;
use framebot_domain::id::JobId;
use framebot_domain::job::Job;
use framebot_domain::run::{RunEvent, RunReport};

use crate::config::Config;

/// The desktop ports as wired by the binary: a replayed window plus
/// templates from disk.
pub type ReplayDesktop = Desktop<VirtualDesktop, VirtualDesktop, VirtualDesktop, FsTemplateStore>;

const EVENT_CAPACITY: usize = 256;

/// Build the desktop for a window titled `title`.
///
/// # Errors
///
/// Fails when no replay directory is configured or its frames cannot be
/// loaded.
pub fn replay_desktop(config: &Config, title: &str) -> anyhow::Result<ReplayDesktop> {
    let dir = config
        .desktop
        .replay_dir
        .as_deref()
        .context("no desktop backend configured: set [desktop] replay_dir")?;
    let window = VirtualDesktop::from_replay_dir(
        title,
        Point::new(config.desktop.left, config.desktop.top),
        dir,
    )
    .with_context(|| format!("failed to load replay frames from {}", dir.display()))?;
    let templates = FsTemplateStore::new(config.templates.directory.clone())
        .with_extension(config.templates.extension.clone());

    Ok(Desktop {
        windows: window.clone(),
        sampler: window.clone(),
        input: window,
        templates,
    })
}

/// Look a job up by name, falling back to its numeric id.
async fn resolve_job(service: &JobService<SqliteJobStore>, key: &str) -> anyhow::Result<Job> {
    match service.find_job(key).await {
        Ok(job) => Ok(job),
        Err(FramebotError::NotFound(_)) => {
            let Ok(id) = key.parse::<JobId>() else {
                bail!("no job named `{key}`");
            };
            service
                .get_job(id)
                .await
                .with_context(|| format!("no job named or numbered `{key}`"))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn list(store: SqliteJobStore) -> anyhow::Result<Vec<(Job, usize)>> {
    let service = JobService::new(store);
    let mut rows = Vec::new();
    for job in service.list_jobs().await? {
        let tasks = service.ordered_tasks(job.id).await?.len();
        rows.push((job, tasks));
    }
    Ok(rows)
}

/// Run a job to completion, passing every progress event to `on_event`.
///
/// # Errors
///
/// Returns the error that stopped the run.
pub async fn run(
    config: &Config,
    store: SqliteJobStore,
    key: &str,
    dry_run: bool,
    on_event: impl Fn(&RunEvent) + Send + 'static,
) -> anyhow::Result<RunReport> {
    let job = resolve_job(&JobService::new(store.clone()), key).await?;
    let desktop = replay_desktop(config, &job.window_title)?;

    let mut scheduler_config = config.scheduler_config();
    scheduler_config.engine.dry_run |= dry_run;

    let bus = InProcessEventBus::new(EVENT_CAPACITY);
    let mut events = bus.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => on_event(&event),
                Err(RecvError::Lagged(missed)) => tracing::warn!(missed, "dropped run events"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let scheduler = RunScheduler::new(store, desktop, bus, scheduler_config);
    let handle = scheduler.spawn(job.id);
    tracing::info!(run = %handle.run_id(), job = %job.name, "run spawned");
    let outcome = handle.wait().await;

    // Closing the last sender ends the printer.
    drop(scheduler);
    printer.await.context("event printer panicked")?;

    outcome.with_context(|| format!("job `{}` failed", job.name))
}

/// Name the screen the job's window currently shows.
///
/// # Errors
///
/// Fails when no probes are configured or the window cannot be sampled.
pub async fn identify(
    config: &Config,
    store: SqliteJobStore,
    key: &str,
) -> anyhow::Result<Option<String>> {
    if config.screens.is_empty() {
        bail!("no [[screens]] probes configured");
    }
    let job = resolve_job(&JobService::new(store), key).await?;
    let desktop = replay_desktop(config, &job.window_title)?;
    let engine = AutomationEngine::new(job.window_title, desktop, config.engine_config());

    Ok(engine.identify_screen(&config.screens).await?)
}

/// Write every job tree to `path` as pretty-printed JSON.
pub async fn export(store: SqliteJobStore, path: &Path) -> anyhow::Result<usize> {
    let bundles = JobService::new(store).export_jobs().await?;
    let json = serde_json::to_string_pretty(&bundles)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(bundles.len())
}

/// Recreate the job trees stored in `path` under fresh ids.
pub async fn import(store: SqliteJobStore, path: &Path) -> anyhow::Result<Vec<Job>> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let bundles: Vec<JobBundle> = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a job export", path.display()))?;
    Ok(JobService::new(store).import_jobs(bundles).await?)
}
