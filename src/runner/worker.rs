// src/runner/worker.rs
//! Bounded job queue drained by a background task.
//!
//! Webhook handlers only enqueue; execution happens on spawned tasks, capped
//! at `max_concurrent_jobs`. Jobs have no timeout and cannot be cancelled
//! once started. Failures are logged and counted, never retried.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

use super::{JobRequest, JobRunner};

#[derive(Clone, Copy, Debug)]
pub struct WorkerCfg {
    pub queue_capacity: usize,
    pub max_concurrent_jobs: usize,
}

impl Default for WorkerCfg {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            max_concurrent_jobs: 4,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("job queue is full")]
    Full,
    #[error("job workers have stopped")]
    Closed,
}

/// Sending half of the job queue. Cheap to clone.
#[derive(Clone, Debug)]
pub struct JobQueue {
    tx: mpsc::Sender<JobRequest>,
}

impl JobQueue {
    /// Enqueue without waiting. Never blocks the caller.
    pub fn submit(&self, job: JobRequest) -> Result<(), SubmitError> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })
    }
}

/// Spawn the consumer task. The returned handle resolves after every
/// [`JobQueue`] clone is dropped and all started jobs have finished.
pub fn spawn_worker_pool(runner: Arc<dyn JobRunner>, cfg: WorkerCfg) -> (JobQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<JobRequest>(cfg.queue_capacity.max(1));
    let permits = Arc::new(Semaphore::new(cfg.max_concurrent_jobs.max(1)));

    let handle = tokio::spawn(async move {
        let mut running = JoinSet::new();
        while let Some(job) = rx.recv().await {
            // reap finished jobs so the set stays small
            while running.try_join_next().is_some() {}

            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };
            let runner = runner.clone();
            running.spawn(async move {
                let _permit = permit;
                run_one(runner.as_ref(), &job).await;
            });
        }
        while running.join_next().await.is_some() {}
        tracing::debug!(target: "runner", "job queue drained");
    });

    (JobQueue { tx }, handle)
}

async fn run_one(runner: &dyn JobRunner, job: &JobRequest) {
    tracing::info!(
        target: "runner",
        runner = runner.name(),
        platform = %job.platform,
        ticket_id = %job.ticket_id,
        workflow = %job.workflow,
        "job started"
    );
    match runner.run(job).await {
        Ok(()) => {
            counter!("jobs_succeeded_total").increment(1);
            tracing::info!(
                target: "runner",
                platform = %job.platform,
                ticket_id = %job.ticket_id,
                "job finished"
            );
        }
        Err(e) => {
            counter!("jobs_failed_total").increment(1);
            tracing::error!(
                target: "runner",
                error = ?e,
                platform = %job.platform,
                ticket_id = %job.ticket_id,
                workflow = %job.workflow,
                "job failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RecordingRunner;
    use crate::ticket::Platform;
    use std::collections::BTreeMap;

    fn job(id: &str) -> JobRequest {
        JobRequest {
            workflow: "playbooks/fix.yaml".into(),
            extra_vars: BTreeMap::new(),
            platform: Platform::Jira,
            ticket_id: id.into(),
        }
    }

    #[tokio::test]
    async fn runs_every_submitted_job() {
        let runner = Arc::new(RecordingRunner::new());
        let (queue, handle) = spawn_worker_pool(runner.clone(), WorkerCfg::default());
        for i in 0..5 {
            queue.submit(job(&format!("NET-{i}"))).unwrap();
        }
        drop(queue);
        handle.await.unwrap();
        assert_eq!(runner.snapshot().len(), 5);
    }

    #[tokio::test]
    async fn failing_jobs_do_not_stop_the_pool() {
        let runner = Arc::new(RecordingRunner::failing());
        let (queue, handle) = spawn_worker_pool(runner.clone(), WorkerCfg::default());
        queue.submit(job("A")).unwrap();
        queue.submit(job("B")).unwrap();
        drop(queue);
        handle.await.unwrap();
        assert_eq!(runner.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_closed() {
        let runner = Arc::new(RecordingRunner::new());
        let (queue, handle) = spawn_worker_pool(runner, WorkerCfg::default());
        handle.abort();
        let _ = handle.await;
        assert_eq!(queue.submit(job("late")), Err(SubmitError::Closed));
    }
}
