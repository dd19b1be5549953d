pub mod notifier;
pub mod slack;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info};

use crate::core::commands::Reply;
use crate::core::notify::{Attachment, Notification};

/// Outbound side of a chat transport.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn post_message(&self, channel: &str, text: &str) -> Result<()>;
    async fn upload_file(&self, attachment: &Attachment) -> Result<()>;
}

/// Send a notification's messages, then its attachment.
///
/// Failures are logged and dropped; nothing is retried.
pub async fn deliver(sink: &dyn ChatSink, notification: &Notification) {
    for text in &notification.messages {
        if let Err(e) = sink.post_message(&notification.channel, text).await {
            error!("Failed to post message to {}: {:#}", notification.channel, e);
        }
    }
    if let Some(attachment) = &notification.attachment {
        match sink.upload_file(attachment).await {
            Ok(()) => info!("Uploaded {} to {}", attachment.filename, attachment.channel),
            Err(e) => error!("Unable to send attachment with message: {:#}", e),
        }
    }
}

/// Send command replies back to the channel the command came from.
pub async fn deliver_replies(sink: &dyn ChatSink, channel: &str, replies: &[Reply]) {
    for reply in replies {
        match reply {
            Reply::Text(text) => {
                if let Err(e) = sink.post_message(channel, text).await {
                    error!("Failed to reply in {}: {:#}", channel, e);
                }
            }
            Reply::Notification(notification) => deliver(sink, notification).await,
        }
    }
}
