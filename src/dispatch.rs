// src/dispatch.rs
//! Turns a [`TicketEvent`] into at most one job submission per ticket.
//!
//! Policy is at-most-once: the dedup claim is taken before submission and is
//! never released, so a ticket whose job could not be queued is not retried
//! by a later webhook.

use std::collections::BTreeMap;
use std::sync::Arc;

use metrics::{counter, describe_counter};

use crate::config::AppConfig;
use crate::datetime::{self, CanonicalTimestamp};
use crate::dedup::Deduplicator;
use crate::runner::{JobQueue, JobRequest};
use crate::ticket::{Platform, TicketEvent};

/// Register descriptions with the installed recorder (so series carry `# HELP`
/// on /metrics). Called by [`crate::metrics::Metrics::init`].
pub fn describe_metrics() {
    describe_counter!("dispatch_dispatched_total", "Tickets whose job was queued.");
    describe_counter!(
        "dispatch_skipped_total",
        "Notifications ignored because the ticket was already worked."
    );
    describe_counter!(
        "job_submit_errors_total",
        "Jobs that could not be queued after the ticket was claimed."
    );
    describe_counter!("jobs_succeeded_total", "Jobs the runner completed.");
    describe_counter!("jobs_failed_total", "Jobs the runner reported as failed.");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Dispatched,
    SkippedDuplicate,
}

/// Which workflow each platform triggers, plus Jira planned-date offsets.
#[derive(Debug, Clone)]
pub struct DispatchCfg {
    pub servicenow_workflow: String,
    pub jira_workflow: String,
    pub jira_planned_add_hours: Option<i64>,
    pub jira_planned_subtract_hours: Option<i64>,
}

impl DispatchCfg {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            servicenow_workflow: cfg.servicenow.workflow.clone(),
            jira_workflow: cfg.jira.workflow.clone(),
            jira_planned_add_hours: cfg.jira.planned_add_hours,
            jira_planned_subtract_hours: cfg.jira.planned_subtract_hours,
        }
    }

    fn workflow_for(&self, platform: Platform) -> &str {
        match platform {
            Platform::ServiceNow => &self.servicenow_workflow,
            Platform::Jira => &self.jira_workflow,
        }
    }
}

impl Default for DispatchCfg {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

pub struct Dispatcher {
    dedup: Arc<Deduplicator>,
    queue: JobQueue,
    cfg: DispatchCfg,
}

impl Dispatcher {
    pub fn new(dedup: Arc<Deduplicator>, queue: JobQueue, cfg: DispatchCfg) -> Self {
        Self { dedup, queue, cfg }
    }

    pub fn deduplicator(&self) -> &Deduplicator {
        &self.dedup
    }

    pub fn handle(&self, event: &TicketEvent) -> DispatchOutcome {
        self.handle_at(event, CanonicalTimestamp::now())
    }

    /// Same as [`Dispatcher::handle`] with an explicit receive time.
    /// Returns as soon as the job is queued (or fails to queue).
    pub fn handle_at(&self, event: &TicketEvent, received_at: CanonicalTimestamp) -> DispatchOutcome {
        if !self.dedup.claim(event.platform, &event.ticket_id) {
            counter!("dispatch_skipped_total", "platform" => event.platform.as_str()).increment(1);
            tracing::info!(
                target: "dispatch",
                platform = %event.platform,
                ticket_id = %event.ticket_id,
                "ignoring webhook, ticket already worked"
            );
            return DispatchOutcome::SkippedDuplicate;
        }

        tracing::info!(
            target: "dispatch",
            platform = %event.platform,
            ticket_id = %event.ticket_id,
            requester = %anon_hash(&event.requester),
            source_ip = %event.source_ip,
            destination_ip = %event.destination_ip,
            "troubleshooting connectivity"
        );

        let job = self.build_job(event, received_at);
        let workflow = job.workflow.clone();
        match self.queue.submit(job) {
            Ok(()) => {
                counter!("dispatch_dispatched_total", "platform" => event.platform.as_str())
                    .increment(1);
            }
            Err(e) => {
                counter!("job_submit_errors_total", "platform" => event.platform.as_str())
                    .increment(1);
                tracing::error!(
                    target: "dispatch",
                    error = %e,
                    platform = %event.platform,
                    ticket_id = %event.ticket_id,
                    %workflow,
                    "job submission failed; ticket stays marked as worked"
                );
            }
        }
        DispatchOutcome::Dispatched
    }

    /// Extra vars: `source_ip`, `destination_ip`, the platform reference key,
    /// `requester`, and `received_at` in the platform's own format. Jira jobs
    /// also get `planned_date` / `planned_date_display`.
    pub fn build_job(&self, event: &TicketEvent, received_at: CanonicalTimestamp) -> JobRequest {
        let mut vars = BTreeMap::new();
        vars.insert("source_ip".to_string(), event.source_ip.clone());
        vars.insert("destination_ip".to_string(), event.destination_ip.clone());
        vars.insert(
            event.platform.reference_key().to_string(),
            event.ticket_id.clone(),
        );
        vars.insert("requester".to_string(), event.requester.clone());

        match event.platform {
            Platform::ServiceNow => {
                vars.insert(
                    "received_at".to_string(),
                    datetime::to_ticketing_format(received_at),
                );
            }
            Platform::Jira => {
                vars.insert(
                    "received_at".to_string(),
                    datetime::to_issue_tracker_format(received_at, true),
                );
                match datetime::apply_offset_hours(
                    received_at,
                    self.cfg.jira_planned_add_hours,
                    self.cfg.jira_planned_subtract_hours,
                ) {
                    Ok(planned) => {
                        vars.insert(
                            "planned_date".to_string(),
                            datetime::to_issue_tracker_format(planned, true),
                        );
                        vars.insert(
                            "planned_date_display".to_string(),
                            datetime::to_issue_tracker_format(planned, false),
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            target: "dispatch",
                            error = %e,
                            ticket_id = %event.ticket_id,
                            "planned date omitted"
                        );
                    }
                }
            }
        }

        JobRequest {
            workflow: self.cfg.workflow_for(event.platform).to_string(),
            extra_vars: vars,
            platform: event.platform,
            ticket_id: event.ticket_id.clone(),
        }
    }
}

/// Short SHA-256 prefix so requester identities never reach the logs raw.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
