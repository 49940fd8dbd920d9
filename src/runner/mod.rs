// src/runner/mod.rs
//! Job runner contract: run a named automation workflow with string-keyed
//! extra variables. Nothing is returned to the webhook caller.

pub mod ansible;
pub mod controller;
pub mod worker;

use std::collections::BTreeMap;

use anyhow::Result;

use crate::ticket::Platform;

pub use ansible::AnsibleRunner;
pub use controller::ControllerRunner;
pub use worker::{spawn_worker_pool, JobQueue, SubmitError, WorkerCfg};

/// One workflow invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    /// Playbook path (relative to the project dir) or controller job template id.
    pub workflow: String,
    /// Always carries `source_ip`, `destination_ip` and the platform reference key.
    pub extra_vars: BTreeMap<String, String>,
    // for logging only
    pub platform: Platform,
    pub ticket_id: String,
}

#[async_trait::async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, job: &JobRequest) -> Result<()>;
    fn name(&self) -> &'static str;
}

// --- Test helper ---
/// Records every job it is asked to run; optionally fails each one.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub calls: parking_lot::Mutex<Vec<JobRequest>>,
    fail: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            calls: parking_lot::Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn snapshot(&self) -> Vec<JobRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl JobRunner for RecordingRunner {
    async fn run(&self, job: &JobRequest) -> Result<()> {
        self.calls.lock().push(job.clone());
        if self.fail {
            anyhow::bail!("recording runner configured to fail");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
