//! FIFO job scheduler with a bounded concurrency drain loop.
//!
//! One manager task owns every status transition, so the job table needs no
//! write coordination beyond the `RwLock` readers share. The default
//! concurrency bound of 1 serializes deployments against a single deployer
//! account; transaction nonces make concurrent sends unsafe.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};

use mintforge_model::{JobId, JobOutcome, JobRecord, JobSpec, JobStatus};

use crate::errors::{DeployError, Result};

/// Executes the work a job spec describes.
///
/// The scheduler stays agnostic of job semantics; the composition root
/// implements this with a `match` over the closed spec variants.
#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    async fn run(&self, job: &JobRecord) -> Result<JobOutcome>;
}

/// Scheduler tuning knobs.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum simultaneously running jobs. Deployments require 1.
    pub concurrency: usize,
    /// Poll cadence of `wait` when no interval is supplied.
    pub default_poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            concurrency: 1,
            default_poll_interval: Duration::from_millis(250),
        }
    }
}

/// Bounds accepted by [`JobScheduler::list`].
const LIST_LIMIT_RANGE: (usize, usize) = (1, 200);

enum ManagerMessage {
    Submitted(JobId),
}

struct JobDone {
    id: JobId,
    outcome: Result<JobOutcome>,
}

/// In-process job scheduler.
///
/// Cloning shares the underlying job table and queue; every clone talks to
/// the same manager task.
#[derive(Clone)]
pub struct JobScheduler {
    jobs: Arc<RwLock<HashMap<JobId, JobRecord>>>,
    manager_tx: mpsc::Sender<ManagerMessage>,
    config: SchedulerConfig,
}

impl std::fmt::Debug for JobScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobScheduler")
            .field("concurrency", &self.config.concurrency)
            .finish_non_exhaustive()
    }
}

impl JobScheduler {
    /// Starts a scheduler draining jobs through `runner`.
    pub fn new(config: SchedulerConfig, runner: Arc<dyn JobRunner>) -> Self {
        let jobs: Arc<RwLock<HashMap<JobId, JobRecord>>> = Arc::new(RwLock::new(HashMap::new()));
        let (manager_tx, manager_rx) = mpsc::channel(256);

        let manager = Manager {
            jobs: jobs.clone(),
            runner,
            concurrency: config.concurrency.max(1),
        };
        tokio::spawn(manager.run(manager_rx));

        JobScheduler {
            jobs,
            manager_tx,
            config,
        }
    }

    /// Records a job as queued and triggers the drain loop.
    ///
    /// Never blocks on the work itself; the returned record is the queued
    /// snapshot.
    pub async fn submit(&self, spec: JobSpec) -> Result<JobRecord> {
        let record = JobRecord::new(spec);
        let id = record.id;

        {
            let mut jobs = self.jobs.write().await;
            jobs.insert(id, record.clone());
        }

        self.manager_tx
            .send(ManagerMessage::Submitted(id))
            .await
            .map_err(|_| DeployError::Internal("scheduler manager stopped".to_string()))?;

        debug!(job_id = %id, kind = record.spec.kind_name(), "job queued");
        Ok(record)
    }

    /// Snapshot of one job, if the id was ever issued.
    pub async fn get(&self, id: JobId) -> Option<JobRecord> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Newest-first job listing; `limit` is clamped to [1, 200].
    pub async fn list(&self, limit: usize) -> Vec<JobRecord> {
        let limit = limit.clamp(LIST_LIMIT_RANGE.0, LIST_LIMIT_RANGE.1);
        let jobs = self.jobs.read().await;
        let mut records: Vec<JobRecord> = jobs.values().cloned().collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        records.truncate(limit);
        records
    }

    /// Suspends until the job reaches a terminal state or `timeout` elapses.
    ///
    /// The timeout cancels only the wait: a still-running job keeps running
    /// and can be re-checked later. A failed job re-raises its recorded error.
    pub async fn wait(
        &self,
        id: JobId,
        timeout: Duration,
        poll_interval: Option<Duration>,
    ) -> Result<JobRecord> {
        let poll_interval = poll_interval.unwrap_or(self.config.default_poll_interval);
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let job = self
                .get(id)
                .await
                .ok_or(DeployError::JobNotFound(id))?;

            match job.status {
                JobStatus::Succeeded => return Ok(job),
                JobStatus::Failed => {
                    return Err(DeployError::JobFailed {
                        id,
                        message: job.error.unwrap_or_else(|| "unknown failure".to_string()),
                    });
                }
                JobStatus::Queued | JobStatus::Running => {
                    let now = tokio::time::Instant::now();
                    if now >= deadline {
                        return Err(DeployError::DeploymentTimedOut(id));
                    }
                    let nap = poll_interval.min(deadline - now);
                    tokio::time::sleep(nap).await;
                }
            }
        }
    }
}

struct Manager {
    jobs: Arc<RwLock<HashMap<JobId, JobRecord>>>,
    runner: Arc<dyn JobRunner>,
    concurrency: usize,
}

impl Manager {
    async fn run(self, mut manager_rx: mpsc::Receiver<ManagerMessage>) {
        info!(concurrency = self.concurrency, "job scheduler started");

        let (done_tx, mut done_rx) = mpsc::channel::<JobDone>(256);
        let mut pending: VecDeque<JobId> = VecDeque::new();
        let mut running: usize = 0;
        let mut submissions_open = true;

        loop {
            tokio::select! {
                msg = manager_rx.recv(), if submissions_open => {
                    match msg {
                        Some(ManagerMessage::Submitted(id)) => pending.push_back(id),
                        None => submissions_open = false,
                    }
                }
                Some(done) = done_rx.recv() => {
                    self.finish_job(done).await;
                    running -= 1;
                }
            }

            while running < self.concurrency {
                let Some(id) = pending.pop_front() else { break };
                if self.start_job(id, done_tx.clone()).await {
                    running += 1;
                }
            }

            if !submissions_open && running == 0 && pending.is_empty() {
                break;
            }
        }

        info!("job scheduler stopped");
    }

    /// Marks a job running and spawns its work. Returns false if the id has
    /// no record (cannot happen through `submit`, but the loop must not stall
    /// on it).
    async fn start_job(&self, id: JobId, done_tx: mpsc::Sender<JobDone>) -> bool {
        let record = {
            let mut jobs = self.jobs.write().await;
            let Some(record) = jobs.get_mut(&id) else {
                warn!(job_id = %id, "queued job has no record, skipping");
                return false;
            };
            record.status = JobStatus::Running;
            record.started_at = Some(Utc::now());
            record.clone()
        };

        info!(job_id = %id, kind = record.spec.kind_name(), "job started");

        let runner = self.runner.clone();
        tokio::spawn(async move {
            // A panicking runner must not leak the concurrency slot.
            let outcome = std::panic::AssertUnwindSafe(runner.run(&record))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(DeployError::Internal("job runner panicked".to_string()))
                });
            let _ = done_tx.send(JobDone { id, outcome }).await;
        });
        true
    }

    async fn finish_job(&self, done: JobDone) {
        let mut jobs = self.jobs.write().await;
        let Some(record) = jobs.get_mut(&done.id) else {
            return;
        };
        record.finished_at = Some(Utc::now());
        match done.outcome {
            Ok(outcome) => {
                record.status = JobStatus::Succeeded;
                record.result = Some(outcome);
                info!(job_id = %done.id, "job succeeded");
            }
            Err(err) => {
                record.status = JobStatus::Failed;
                record.error = Some(err.to_string());
                error!(job_id = %done.id, error = %err, "job failed");
            }
        }
    }
}
