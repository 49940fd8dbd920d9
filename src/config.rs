// src/config.rs
//! Service configuration loaded from TOML.
//!
//! Lookup order for [`AppConfig::load_default`]:
//! 1) `$ITSM_AUTOMATION_CONFIG`
//! 2) `config/automation.toml`
//! 3) built-in defaults

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::runner::WorkerCfg;
use crate::ticket::jira::{DEFAULT_DESTINATION_IP_FIELD, DEFAULT_SOURCE_IP_FIELD};

pub const ENV_CONFIG_PATH: &str = "ITSM_AUTOMATION_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/automation.toml";
pub const ENV_CONTROLLER_TOKEN: &str = "AWX_TOKEN";

fn default_servicenow_workflow() -> String {
    "playbooks/module-4/c6_servicenow_connectivity_issue_resolution.yaml".to_string()
}
fn default_jira_workflow() -> String {
    "playbooks/module-7/c6_jira_connectivity_issue_resolution.yaml".to_string()
}
fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_inventory() -> PathBuf {
    PathBuf::from("inventory.yaml")
}
fn default_ansible_config() -> PathBuf {
    PathBuf::from("ansible.cfg")
}
fn default_queue_capacity() -> usize {
    WorkerCfg::default().queue_capacity
}
fn default_max_concurrent_jobs() -> usize {
    WorkerCfg::default().max_concurrent_jobs
}
fn default_source_ip_field() -> String {
    DEFAULT_SOURCE_IP_FIELD.to_string()
}
fn default_destination_ip_field() -> String {
    DEFAULT_DESTINATION_IP_FIELD.to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub servicenow: ServiceNowConfig,
    #[serde(default)]
    pub jira: JiraConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
    /// Local `ansible-playbook`.
    #[default]
    Ansible,
    /// AWX / Automation Controller job templates.
    Controller,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub kind: RunnerKind,
    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,
    /// Relative to `project_dir`.
    #[serde(default = "default_inventory")]
    pub inventory: PathBuf,
    /// Relative to `project_dir`.
    #[serde(default = "default_ansible_config")]
    pub ansible_config: PathBuf,
    #[serde(default)]
    pub controller_url: Option<String>,
    /// "ENV" means: read from AWX_TOKEN
    #[serde(default)]
    pub controller_token: Option<String>,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            kind: RunnerKind::default(),
            project_dir: default_project_dir(),
            inventory: default_inventory(),
            ansible_config: default_ansible_config(),
            controller_url: None,
            controller_token: None,
            queue_capacity: default_queue_capacity(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

impl RunnerConfig {
    pub fn worker_cfg(&self) -> WorkerCfg {
        WorkerCfg {
            queue_capacity: self.queue_capacity,
            max_concurrent_jobs: self.max_concurrent_jobs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceNowConfig {
    #[serde(default = "default_servicenow_workflow")]
    pub workflow: String,
}

impl Default for ServiceNowConfig {
    fn default() -> Self {
        Self {
            workflow: default_servicenow_workflow(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraConfig {
    #[serde(default = "default_jira_workflow")]
    pub workflow: String,
    #[serde(default = "default_source_ip_field")]
    pub source_ip_field: String,
    #[serde(default = "default_destination_ip_field")]
    pub destination_ip_field: String,
    /// Hour offsets applied to the receive time to get the planned date.
    #[serde(default)]
    pub planned_add_hours: Option<i64>,
    #[serde(default)]
    pub planned_subtract_hours: Option<i64>,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            workflow: default_jira_workflow(),
            source_ip_field: default_source_ip_field(),
            destination_ip_field: default_destination_ip_field(),
            planned_add_hours: None,
            planned_subtract_hours: None,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s).context("parse automation config")?;
        cfg.sanitize()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
        if fallback.exists() {
            return Self::load_from(&fallback);
        }
        let mut cfg = Self::default();
        cfg.sanitize()?;
        Ok(cfg)
    }

    fn sanitize(&mut self) -> Result<()> {
        let r = &mut self.runner;
        r.queue_capacity = r.queue_capacity.max(1);
        r.max_concurrent_jobs = r.max_concurrent_jobs.max(1);

        if let Some(tok) = &r.controller_token {
            if tok.trim().eq_ignore_ascii_case("env") {
                r.controller_token = Some(
                    std::env::var(ENV_CONTROLLER_TOKEN)
                        .map_err(|_| anyhow!("Missing {ENV_CONTROLLER_TOKEN} env var"))?,
                );
            }
        }
        if r.kind == RunnerKind::Controller {
            if r.controller_url.is_none() {
                anyhow::bail!("runner.kind = \"controller\" requires runner.controller_url");
            }
            if r.controller_token.as_deref().map_or(true, |t| t.trim().is_empty()) {
                anyhow::bail!("runner.kind = \"controller\" requires runner.controller_token");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.runner.kind, RunnerKind::Ansible);
        assert_eq!(cfg.servicenow.workflow, default_servicenow_workflow());
        assert_eq!(cfg.jira.source_ip_field, "customfield_10060");
        assert_eq!(cfg.jira.planned_add_hours, None);
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let cfg = AppConfig::from_toml_str(
            r#"
[runner]
queue_capacity = 0
max_concurrent_jobs = 0
"#,
        )
        .unwrap();
        assert_eq!(cfg.runner.queue_capacity, 1);
        assert_eq!(cfg.runner.max_concurrent_jobs, 1);
    }

    #[test]
    fn controller_requires_url() {
        let err = AppConfig::from_toml_str("[runner]\nkind = \"controller\"\n").unwrap_err();
        assert!(err.to_string().contains("controller_url"));
    }

    #[test]
    fn controller_requires_non_empty_token() {
        let base = "[runner]\nkind = \"controller\"\ncontroller_url = \"https://awx.example.com\"\n";
        let err = AppConfig::from_toml_str(base).unwrap_err();
        assert!(err.to_string().contains("controller_token"));

        let blank = format!("{base}controller_token = \"  \"\n");
        assert!(AppConfig::from_toml_str(&blank).is_err());

        let ok = format!("{base}controller_token = \"t0ken\"\n");
        assert!(AppConfig::from_toml_str(&ok).is_ok());
    }
}
