use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    Launch,
    WorkflowLaunch,
    Test,
    Upgrade,
    Build,
}

impl JobType {
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::Launch => "launch",
            JobType::WorkflowLaunch => "workflow-launch",
            JobType::Test => "test",
            JobType::Upgrade => "upgrade",
            JobType::Build => "build",
        }
    }

    /// Jobs whose product is a cluster handed to the user.
    pub fn is_cluster_launch(self) -> bool {
        matches!(self, JobType::Launch | JobType::WorkflowLaunch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Pending,
    Running,
    Success,
    Failure,
    Error,
    Aborted,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Success => "success",
            JobState::Failure => "failure",
            JobState::Error => "error",
            JobState::Aborted => "aborted",
        }
    }

    pub fn is_failed(self) -> bool {
        matches!(self, JobState::Failure | JobState::Error | JobState::Aborted)
    }
}

/// One user ask, ready to hand to the job manager. Serializes to the JSON
/// shape job managers log and forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRequest {
    pub original_message: String,
    pub user: String,
    pub channel: String,
    pub inputs: Vec<Vec<String>>,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub platform: String,
    pub architecture: String,
    pub job_params: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_name: Option<String>,
}

/// Snapshot of a job as reported by the job manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    pub mode: JobType,
    pub state: JobState,
    pub url: Option<String>,
    pub credentials: Option<String>,
    pub failure: Option<String>,
    pub password_snippet: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub legacy_config: bool,
    pub requested_by: String,
    pub requested_channel: String,
    pub original_message: String,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Job {
    pub fn new(name: impl Into<String>, mode: JobType, requested_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            mode,
            state: JobState::Pending,
            url: None,
            credentials: None,
            failure: None,
            password_snippet: None,
            requested_at,
            expires_at: None,
            legacy_config: false,
            requested_by: String::new(),
            requested_channel: String::new(),
            original_message: String::new(),
        }
    }

    // Empty strings count as absent everywhere below.

    pub fn url(&self) -> Option<&str> {
        present(&self.url)
    }

    pub fn credentials(&self) -> Option<&str> {
        present(&self.credentials)
    }

    pub fn failure(&self) -> Option<&str> {
        present(&self.failure)
    }

    pub fn password_snippet(&self) -> Option<&str> {
        present(&self.password_snippet)
    }
}
