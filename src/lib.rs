// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod datetime;
pub mod dedup;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod runner;
pub mod ticket;

use std::sync::Arc;

use axum::Router;
use tokio::task::JoinHandle;

pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::dispatch::{DispatchOutcome, Dispatcher};
pub use crate::error::AutomationError;
pub use crate::runner::{JobRequest, JobRunner};
pub use crate::ticket::{Platform, TicketEvent};

use crate::dedup::Deduplicator;
use crate::dispatch::DispatchCfg;
use crate::runner::{spawn_worker_pool, AnsibleRunner, ControllerRunner};
use crate::ticket::JiraExtractor;

/// Build the runner selected by `[runner] kind`.
pub fn build_runner(cfg: &AppConfig) -> anyhow::Result<Arc<dyn JobRunner>> {
    let r = &cfg.runner;
    Ok(match r.kind {
        config::RunnerKind::Ansible => Arc::new(
            AnsibleRunner::new(&r.project_dir)
                .with_inventory(&r.inventory)
                .with_ansible_config(&r.ansible_config),
        ),
        config::RunnerKind::Controller => {
            let url = r
                .controller_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("runner.controller_url is not set"))?;
            let token = r
                .controller_token
                .clone()
                .ok_or_else(|| anyhow::anyhow!("runner.controller_token is not set"))?;
            Arc::new(ControllerRunner::new(url, token))
        }
    })
}

/// Wire dedup, worker pool, dispatcher and routes. Must run inside a Tokio
/// runtime; the returned handle is the worker pool's consumer task.
pub fn app(cfg: &AppConfig, runner: Arc<dyn JobRunner>) -> (Router, JoinHandle<()>) {
    let (queue, workers) = spawn_worker_pool(runner, cfg.runner.worker_cfg());
    let dispatcher = Dispatcher::new(
        Arc::new(Deduplicator::new()),
        queue,
        DispatchCfg::from_config(cfg),
    );
    let jira = JiraExtractor::new(&cfg.jira.source_ip_field, &cfg.jira.destination_ip_field);
    let state = AppState::new(Arc::new(dispatcher), jira);
    (api::router(state), workers)
}
