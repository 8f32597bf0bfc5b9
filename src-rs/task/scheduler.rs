use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::ApiError;
use crate::gateway::Gateway;
use crate::ingest::PreparedDocument;
use crate::parser::ParseOptions;

use super::store::{next_id, TaskStore};
use super::types::{Task, TaskUpdate};

const PROGRESS_STARTED: f64 = 0.1;
const PROGRESS_ADMITTED: f64 = 0.3;

/// Runs async parse jobs and the periodic task sweep.
#[derive(Clone)]
pub struct BackgroundScheduler {
    gateway: Arc<Gateway>,
}

impl BackgroundScheduler {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Records a pending task and hands the document to a background job.
    /// Returns as soon as the task exists; the job owns the document from here.
    pub fn submit(&self, document: PreparedDocument, options: ParseOptions) -> Result<Task, ApiError> {
        let id = next_id();
        let task = self.gateway.tasks().create(&id)?;
        tracing::info!("task {} submitted for {}", id, document.stem);
        tokio::spawn(run_job(self.gateway.clone(), id, document, options));
        Ok(task)
    }

    /// Removes expired tasks every `interval` until `shutdown` flips to true
    /// or its sender goes away.
    pub fn spawn_sweeper(
        &self,
        interval: Duration,
        ttl: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let tasks = self.gateway.tasks().clone();
        tokio::spawn(sweep_loop(tasks, interval, ttl, shutdown))
    }
}

async fn run_job(gateway: Arc<Gateway>, id: String, document: PreparedDocument, options: ParseOptions) {
    match drive(&gateway, &id, document, &options).await {
        Ok(()) => tracing::info!("task {} completed", id),
        Err(err) => {
            tracing::warn!("task {} failed: {}", id, err);
            if let Err(update_err) = gateway.tasks().update(&id, TaskUpdate::failed(err.to_string())) {
                tracing::error!("could not record failure for task {}: {}", id, update_err);
            }
        }
    }
}

async fn drive(
    gateway: &Gateway,
    id: &str,
    document: PreparedDocument,
    options: &ParseOptions,
) -> Result<(), ApiError> {
    let tasks = gateway.tasks();
    tasks.update(id, TaskUpdate::processing(PROGRESS_STARTED))?;

    // Queue here instead of failing; the caller already has its task id.
    let permit = gateway.gate().acquire().await?;
    tasks.update(id, TaskUpdate::progress(PROGRESS_ADMITTED))?;

    let output = gateway.parse_admitted(permit, document, options).await?;
    tasks.update(id, TaskUpdate::completed(output))?;
    Ok(())
}

async fn sweep_loop(
    tasks: Arc<TaskStore>,
    interval: Duration,
    ttl: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => match tasks.cleanup_expired(ttl) {
                Ok(0) => tracing::debug!("task sweep: nothing expired"),
                Ok(removed) => tracing::info!("task sweep removed {} expired tasks", removed),
                Err(err) => tracing::error!("task sweep failed: {}", err),
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    tracing::info!("task sweeper stopped");
}
