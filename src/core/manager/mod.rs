mod dry_run;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

use super::job::{Job, JobRequest};

pub use dry_run::DryRunManager;

/// The external service that schedules jobs and reports on them.
///
/// Every error message is shown to the user as-is.
#[async_trait]
pub trait JobManager: Send + Sync {
    async fn launch_job_for_user(&self, request: JobRequest) -> Result<String>;
    async fn lookup_inputs(&self, inputs: &[String]) -> Result<String>;
    async fn list_jobs(&self, user: &str) -> String;
    async fn sync_job_for_user(&self, user: &str) -> Result<String>;
    async fn terminate_job_for_user(&self, user: &str) -> Result<String>;
    async fn get_launch_job(&self, user: &str) -> Result<Job>;

    /// Snapshots of jobs whose status changed.
    fn subscribe(&self) -> broadcast::Receiver<Job>;
}
