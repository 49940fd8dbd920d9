// src/runner/ansible.rs
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;

use super::{JobRequest, JobRunner};

const STDERR_TAIL_CHARS: usize = 2_000;

/// Runs playbooks locally with `ansible-playbook`.
///
/// The playbook path (`JobRequest::workflow`) is resolved against
/// `project_dir`, which is also the working directory. Inventory and
/// `ANSIBLE_CONFIG` default to `inventory.yaml` and `ansible.cfg` there.
#[derive(Debug, Clone)]
pub struct AnsibleRunner {
    program: String,
    project_dir: PathBuf,
    inventory: PathBuf,
    ansible_config: PathBuf,
}

impl AnsibleRunner {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        Self {
            program: "ansible-playbook".to_string(),
            inventory: project_dir.join("inventory.yaml"),
            ansible_config: project_dir.join("ansible.cfg"),
            project_dir,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_inventory(mut self, inventory: impl AsRef<Path>) -> Self {
        self.inventory = self.project_dir.join(inventory);
        self
    }

    pub fn with_ansible_config(mut self, cfg: impl AsRef<Path>) -> Self {
        self.ansible_config = self.project_dir.join(cfg);
        self
    }

    /// Command-line arguments for one job (program name excluded).
    pub fn args(&self, job: &JobRequest) -> Result<Vec<OsString>> {
        let extra_vars =
            serde_json::to_string(&job.extra_vars).context("serialize extra vars")?;
        Ok(vec![
            "-i".into(),
            self.inventory.clone().into_os_string(),
            self.project_dir.join(&job.workflow).into_os_string(),
            "--extra-vars".into(),
            extra_vars.into(),
        ])
    }
}

#[async_trait::async_trait]
impl JobRunner for AnsibleRunner {
    async fn run(&self, job: &JobRequest) -> Result<()> {
        let out = Command::new(&self.program)
            .args(self.args(job)?)
            .current_dir(&self.project_dir)
            .env("ANSIBLE_CONFIG", &self.ansible_config)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("spawn {}", self.program))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let tail: String = stderr
                .chars()
                .rev()
                .take(STDERR_TAIL_CHARS)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            anyhow::bail!("{} exited with {}: {}", self.program, out.status, tail.trim());
        }
        tracing::debug!(
            target: "runner",
            ticket_id = %job.ticket_id,
            stdout_bytes = out.stdout.len(),
            "ansible-playbook completed"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ansible-playbook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::Platform;
    use std::collections::BTreeMap;

    fn job() -> JobRequest {
        let mut vars = BTreeMap::new();
        vars.insert("source_ip".to_string(), "10.0.0.1".to_string());
        vars.insert("destination_ip".to_string(), "10.0.0.2".to_string());
        vars.insert("jira_issue_key".to_string(), "NET-1".to_string());
        JobRequest {
            workflow: "playbooks/module-7/c6_jira_connectivity_issue_resolution.yaml".into(),
            extra_vars: vars,
            platform: Platform::Jira,
            ticket_id: "NET-1".into(),
        }
    }

    #[test]
    fn args_resolve_paths_against_project_dir() {
        let r = AnsibleRunner::new("/srv/itsm").with_inventory("hosts.ini");
        let args = r.args(&job()).unwrap();
        assert_eq!(args[0], "-i");
        assert_eq!(args[1], "/srv/itsm/hosts.ini");
        assert_eq!(
            args[2],
            "/srv/itsm/playbooks/module-7/c6_jira_connectivity_issue_resolution.yaml"
        );
        assert_eq!(args[3], "--extra-vars");
        let vars: serde_json::Value =
            serde_json::from_str(args[4].to_str().unwrap()).unwrap();
        assert_eq!(vars["source_ip"], "10.0.0.1");
        assert_eq!(vars["jira_issue_key"], "NET-1");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_status_decides_success() {
        let dir = tempfile::tempdir().unwrap();
        let ok = AnsibleRunner::new(dir.path()).with_program("true");
        assert!(ok.run(&job()).await.is_ok());

        let bad = AnsibleRunner::new(dir.path()).with_program("false");
        let err = bad.run(&job()).await.unwrap_err();
        assert!(err.to_string().contains("false exited with"));
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let r = AnsibleRunner::new(dir.path()).with_program("definitely-not-ansible-xyz");
        assert!(r.run(&job()).await.is_err());
    }
}
