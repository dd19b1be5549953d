//! Turn job snapshots into chat messages.
//!
//! [`format`] always produces something; [`render`] is what the notification
//! feed uses and drops snapshots nobody can or should be told about yet.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use super::job::{Job, JobState};

pub const LEGACY_CONFIG_WARNING: &str = "WARNING: using legacy template based job for this cluster. This is unsupported and the cluster may not install as expected. Contact #forum-crt for more information.";

/// Credentials file sent alongside a ready cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub channel: String,
    pub filename: String,
    pub filetype: String,
    pub content: String,
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    pub channel: String,
    pub messages: Vec<String>,
    pub attachment: Option<Attachment>,
}

impl Notification {
    fn new(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            ..Self::default()
        }
    }

    fn say(mut self, text: impl Into<String>) -> Self {
        self.messages.push(text.into());
        self
    }

    fn attach(mut self, job: &Job, credentials: &str, comment: String) -> Self {
        self.attachment = Some(Attachment {
            channel: job.requested_channel.clone(),
            filename: credentials_filename(job.requested_at),
            filetype: "text".to_string(),
            content: credentials.to_string(),
            comment,
        });
        self
    }
}

pub fn credentials_filename(requested_at: DateTime<Utc>) -> String {
    format!(
        "cluster-bot-{}.kubeconfig",
        requested_at.format("%Y-%m-%d-%H%M%S")
    )
}

fn whole_minutes(delta: TimeDelta) -> i64 {
    delta.num_minutes()
}

/// Where a cluster launch stands, in message precedence order.
#[derive(Debug, PartialEq, Eq)]
enum LaunchProgress<'a> {
    FailedWithLogs { failure: &'a str, url: &'a str },
    Failed { failure: &'a str },
    StartingWithLogs { url: &'a str },
    Starting,
    Ready { credentials: &'a str },
}

impl<'a> LaunchProgress<'a> {
    fn of(job: &'a Job) -> Self {
        match (job.failure(), job.url(), job.credentials()) {
            (Some(failure), Some(url), _) => LaunchProgress::FailedWithLogs { failure, url },
            (Some(failure), None, _) => LaunchProgress::Failed { failure },
            (None, Some(url), None) => LaunchProgress::StartingWithLogs { url },
            (None, None, None) => LaunchProgress::Starting,
            (None, _, Some(credentials)) => LaunchProgress::Ready { credentials },
        }
    }
}

/// Where a test, upgrade or build job stands, in message precedence order.
#[derive(Debug, PartialEq, Eq)]
enum JobProgress<'a> {
    Failed { url: &'a str },
    Succeeded { url: &'a str },
    Running { url: &'a str },
    Waiting,
    ClusterUp { credentials: &'a str, url: Option<&'a str> },
}

impl<'a> JobProgress<'a> {
    fn of(job: &'a Job) -> Self {
        match (job.url(), job.state, job.credentials()) {
            (Some(url), state, _) if state.is_failed() => JobProgress::Failed { url },
            (Some(url), JobState::Success, _) => JobProgress::Succeeded { url },
            (Some(url), _, None) => JobProgress::Running { url },
            (None, _, None) => JobProgress::Waiting,
            (url, _, Some(credentials)) => JobProgress::ClusterUp { credentials, url },
        }
    }
}

/// Render the message for a job snapshot, as seen at `now`.
pub fn format(job: &Job, now: DateTime<Utc>) -> Notification {
    let out = Notification::new(&job.requested_channel);

    if job.mode.is_cluster_launch() {
        let out = if job.legacy_config {
            out.say(LEGACY_CONFIG_WARNING)
        } else {
            out
        };
        let launched = whole_minutes(now - job.requested_at);
        return match LaunchProgress::of(job) {
            LaunchProgress::FailedWithLogs { failure, url } => out.say(format!(
                "your cluster failed to launch: {} (<{}|logs>)",
                failure, url
            )),
            LaunchProgress::Failed { failure } => {
                out.say(format!("your cluster failed to launch: {}", failure))
            }
            LaunchProgress::StartingWithLogs { url } => out.say(format!(
                "cluster is still starting (launched {} minutes ago, <{}|logs>)",
                launched, url
            )),
            LaunchProgress::Starting => out.say(format!(
                "cluster is still starting (launched {} minutes ago)",
                launched
            )),
            LaunchProgress::Ready { credentials } => {
                let expires_at = job.expires_at.unwrap_or(now);
                let mut comment = format!(
                    "Your cluster is ready, it will be shut down automatically in ~{} minutes.",
                    whole_minutes(expires_at - now)
                );
                if let Some(snippet) = job.password_snippet() {
                    comment.push('\n');
                    comment.push_str(snippet);
                }
                out.attach(job, credentials, comment)
            }
        };
    }

    match JobProgress::of(job) {
        JobProgress::Failed { url } => {
            out.say(format!("job <{}|{}> failed", url, job.original_message))
        }
        JobProgress::Succeeded { url } => {
            out.say(format!("job <{}|{}> succeeded", url, job.original_message))
        }
        JobProgress::Running { url } if !job.original_message.is_empty() => {
            out.say(format!("job <{}|{}> is running", url, job.original_message))
        }
        JobProgress::Running { url } => {
            out.say(format!("job is running, see {} for details", url))
        }
        JobProgress::Waiting => out.say(format!(
            "job is running (launched {} minutes ago)",
            whole_minutes(now - job.requested_at)
        )),
        JobProgress::ClusterUp { credentials, url } => {
            let mut comment =
                "Your job has started a cluster, it will be shut down when the test ends."
                    .to_string();
            if let Some(url) = url {
                comment.push_str(&format!(" See {} for details.", url));
            }
            if let Some(snippet) = job.password_snippet() {
                comment.push('\n');
                comment.push_str(snippet);
            }
            out.attach(job, credentials, comment)
        }
    }
}

/// Like [`format`], but drops snapshots that have nowhere to go or nothing
/// worth saying yet. The manager notifies again on the next change.
pub fn render(job: &Job, now: DateTime<Utc>) -> Option<Notification> {
    if job.requested_channel.is_empty() || job.requested_by.is_empty() {
        info!("job {:?} has no requested channel or user, can't notify", job.name);
        return None;
    }
    if job.mode.is_cluster_launch() {
        if job.credentials().is_none() && job.failure().is_none() {
            info!("job {:?}: no credentials or failure, still pending", job.name);
            return None;
        }
    } else if job.url().is_none() && job.failure().is_none() {
        info!("job {:?}: no URL or failure, still pending", job.name);
        return None;
    }
    Some(format(job, now))
}
