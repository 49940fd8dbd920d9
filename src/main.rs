//! ITSM automation webhook service — binary entrypoint.
//! Boots the Axum HTTP server with the ServiceNow and Jira webhook routes.

use itsm_automation::{app, build_runner, config::AppConfig, metrics::Metrics};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("itsm_automation=info,warn"));

    // Shuttle may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default()?;
    let runner = build_runner(&cfg)?;
    tracing::info!(
        runner = runner.name(),
        servicenow_workflow = %cfg.servicenow.workflow,
        jira_workflow = %cfg.jira.workflow,
        max_concurrent_jobs = cfg.runner.max_concurrent_jobs,
        "automation config loaded"
    );

    // Recorder must be installed before any describe/counter call.
    let metrics = Metrics::init()
        .map_err(|e| tracing::warn!(error = ?e, "metrics disabled"))
        .ok();

    let (mut router, _workers) = app(&cfg, runner);
    if let Some(m) = metrics {
        router = router.merge(m.router());
    }

    Ok(router.into())
}
