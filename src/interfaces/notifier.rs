use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ChatSink, deliver};
use crate::core::manager::JobManager;
use crate::core::notify;

/// Forward job status changes from the manager to chat until cancelled.
pub fn spawn_notifier(
    manager: Arc<dyn JobManager>,
    sink: Arc<dyn ChatSink>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let mut events = manager.subscribe();
    tokio::spawn(async move {
        info!("Job notifier started");
        loop {
            let job = tokio::select! {
                _ = cancel.cancelled() => break,
                received = events.recv() => match received {
                    Ok(job) => job,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Job notifier fell behind, skipped {} updates", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };
            debug!("Job {} is {}", job.name, job.state.as_str());
            if let Some(notification) = notify::render(&job, Utc::now()) {
                deliver(sink.as_ref(), &notification).await;
            }
        }
        info!("Job notifier stopped");
    })
}
