use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use super::JobManager;
use crate::core::job::{Job, JobRequest};
use crate::core::text::code_list;

/// In-memory manager that records requests without provisioning anything.
///
/// Every accepted request shows up on the notification feed as a pending job.
pub struct DryRunManager {
    jobs: Mutex<Vec<Job>>,
    events: broadcast::Sender<Job>,
    cluster_lifetime: TimeDelta,
}

impl Default for DryRunManager {
    fn default() -> Self {
        Self::new(TimeDelta::hours(2))
    }
}

impl DryRunManager {
    pub fn new(cluster_lifetime: TimeDelta) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            jobs: Mutex::new(Vec::new()),
            events,
            cluster_lifetime,
        }
    }

    #[cfg(test)]
    pub async fn jobs(&self) -> Vec<Job> {
        self.jobs.lock().await.clone()
    }

    /// Push a snapshot to subscribers as if the job had changed.
    pub fn publish(&self, job: Job) {
        // no receivers just means nobody is listening yet
        let _ = self.events.send(job);
    }

    fn is_users_launch(job: &Job, user: &str) -> bool {
        job.mode.is_cluster_launch() && job.requested_by == user
    }
}

#[async_trait]
impl JobManager for DryRunManager {
    async fn launch_job_for_user(&self, request: JobRequest) -> Result<String> {
        let mut jobs = self.jobs.lock().await;
        if request.job_type.is_cluster_launch()
            && jobs.iter().any(|j| Self::is_users_launch(j, &request.user))
        {
            return Err(anyhow!(
                "you have already requested a cluster, use `done` to release it before requesting another"
            ));
        }

        let now = Utc::now();
        let name = format!("dry-run-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
        let mut job = Job::new(name.clone(), request.job_type, now);
        job.requested_by = request.user.clone();
        job.requested_channel = request.channel.clone();
        job.original_message = request.original_message.clone();
        if request.job_type.is_cluster_launch() {
            job.expires_at = Some(now + self.cluster_lifetime);
        }

        info!(
            "Recorded {} job {} for {} (platform={}, architecture={})",
            request.job_type.as_str(),
            name,
            request.user,
            request.platform,
            request.architecture
        );
        match serde_json::to_string(&request) {
            Ok(json) => debug!("Dry-run request {}: {}", name, json),
            Err(e) => warn!("Could not encode request {}: {}", name, e),
        }
        jobs.push(job.clone());
        drop(jobs);
        self.publish(job);

        let inputs = request
            .inputs
            .iter()
            .map(|group| group.join(","))
            .collect::<Vec<_>>();
        let mut reply = format!(
            "recorded {} job `{}` on {} ({}), nothing will be provisioned in dry-run mode",
            request.job_type.as_str(),
            name,
            request.platform,
            request.architecture
        );
        if !inputs.is_empty() {
            reply.push_str(&format!(", inputs: {}", code_list(&inputs)));
        }
        if !request.job_params.is_empty() {
            let params = request
                .job_params
                .iter()
                .map(|(k, v)| if v.is_empty() { k.clone() } else { format!("{}={}", k, v) })
                .collect::<Vec<_>>();
            reply.push_str(&format!(", parameters: {}", code_list(&params)));
        }
        if let Some(workflow) = &request.workflow_name {
            reply.push_str(&format!(", workflow: `{}`", workflow));
        }
        Ok(reply)
    }

    async fn lookup_inputs(&self, inputs: &[String]) -> Result<String> {
        if inputs.is_empty() {
            return Err(anyhow!("you must specify an image, version or pull request to look up"));
        }
        Ok(format!(
            "would resolve {} (dry-run mode has no release information)",
            code_list(inputs)
        ))
    }

    async fn list_jobs(&self, _user: &str) -> String {
        let jobs = self.jobs.lock().await;
        if jobs.is_empty() {
            return "No jobs are running".to_string();
        }
        let mut lines = vec![format!("{} jobs:", jobs.len())];
        for job in jobs.iter() {
            lines.push(format!(
                "• `{}` {} for <@{}>, {}",
                job.name,
                job.mode.as_str(),
                job.requested_by,
                job.state.as_str()
            ));
        }
        lines.join("\n")
    }

    async fn sync_job_for_user(&self, user: &str) -> Result<String> {
        let job = self.get_launch_job(user).await?;
        self.publish(job);
        Ok("requesting a refresh of your cluster status".to_string())
    }

    async fn terminate_job_for_user(&self, user: &str) -> Result<String> {
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|j| !Self::is_users_launch(j, user));
        if jobs.len() == before {
            return Err(anyhow!("you haven't requested a cluster or your cluster has already been shut down"));
        }
        info!("Released launch job for {}", user);
        Ok("your cluster will be terminated".to_string())
    }

    async fn get_launch_job(&self, user: &str) -> Result<Job> {
        let jobs = self.jobs.lock().await;
        jobs.iter()
            .find(|j| Self::is_users_launch(j, user))
            .cloned()
            .ok_or_else(|| anyhow!("you haven't requested a cluster or your cluster has already been shut down"))
    }

    fn subscribe(&self) -> broadcast::Receiver<Job> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::job::{JobState, JobType};
    use std::collections::BTreeMap;

    fn request(user: &str, job_type: JobType) -> JobRequest {
        JobRequest {
            original_message: "launch 4.15".to_string(),
            user: user.to_string(),
            channel: "D1".to_string(),
            inputs: vec![vec!["4.15".to_string()]],
            job_type,
            platform: "gcp".to_string(),
            architecture: "amd64".to_string(),
            job_params: BTreeMap::from([("ovn".to_string(), String::new())]),
            workflow_name: None,
        }
    }

    #[tokio::test]
    async fn launch_publishes_pending_job() {
        let manager = DryRunManager::default();
        let mut rx = manager.subscribe();

        let reply = manager
            .launch_job_for_user(request("U1", JobType::Launch))
            .await
            .unwrap();
        assert!(reply.contains("inputs: `4.15`"), "{reply}");
        assert!(reply.contains("parameters: `ovn`"), "{reply}");

        let job = rx.recv().await.unwrap();
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.requested_by, "U1");
        assert!(job.expires_at.is_some());
    }

    #[tokio::test]
    async fn one_cluster_per_user() {
        let manager = DryRunManager::default();
        manager
            .launch_job_for_user(request("U1", JobType::Launch))
            .await
            .unwrap();
        assert!(
            manager
                .launch_job_for_user(request("U1", JobType::WorkflowLaunch))
                .await
                .is_err()
        );
        // tests don't count against the cluster limit
        manager
            .launch_job_for_user(request("U1", JobType::Test))
            .await
            .unwrap();
        assert_eq!(manager.jobs().await.len(), 2);
    }

    #[tokio::test]
    async fn terminate_releases_cluster() {
        let manager = DryRunManager::default();
        assert!(manager.terminate_job_for_user("U1").await.is_err());
        manager
            .launch_job_for_user(request("U1", JobType::Launch))
            .await
            .unwrap();
        assert!(manager.get_launch_job("U1").await.is_ok());
        manager.terminate_job_for_user("U1").await.unwrap();
        assert!(manager.get_launch_job("U1").await.is_err());
        assert_eq!(manager.list_jobs("U1").await, "No jobs are running");
    }
}
