// src/runner/controller.rs
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use super::{JobRequest, JobRunner};

/// Launches a job template on AWX / Automation Controller.
/// `JobRequest::workflow` is the job template id or name.
pub struct ControllerRunner {
    base_url: String,
    token: String,
    client: Client,
    timeout: Duration,
}

impl ControllerRunner {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            client: Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Applies to the launch request only, not to the job it starts.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn launch_url(&self, template: &str) -> String {
        format!(
            "{}/api/v2/job_templates/{}/launch/",
            self.base_url.trim_end_matches('/'),
            template
        )
    }
}

#[async_trait::async_trait]
impl JobRunner for ControllerRunner {
    async fn run(&self, job: &JobRequest) -> Result<()> {
        let body = serde_json::json!({ "extra_vars": job.extra_vars });
        let rsp = self
            .client
            .post(self.launch_url(&job.workflow))
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("controller launch")?
            .error_for_status()
            .context("controller non-2xx")?;

        let launched: serde_json::Value = rsp.json().await.unwrap_or_default();
        tracing::info!(
            target: "runner",
            ticket_id = %job.ticket_id,
            controller_job = ?launched.get("job"),
            "controller job launched"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "controller"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_url_tolerates_trailing_slash() {
        let r = ControllerRunner::new("https://awx.example.com/", "t");
        assert_eq!(
            r.launch_url("17"),
            "https://awx.example.com/api/v2/job_templates/17/launch/"
        );
    }
}
