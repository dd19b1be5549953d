use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::Arc;

use super::{ExecArgs, build_bot, load_config, load_workflows};
use crate::core::commands::ChatEvent;
use crate::core::manager::DryRunManager;
use crate::core::notify::Attachment;
use crate::core::terminal;
use crate::interfaces::{ChatSink, deliver_replies};
use crate::logging::{self, LogTarget};

/// Prints what would have been sent to chat.
struct ConsoleSink;

#[async_trait]
impl ChatSink for ConsoleSink {
    async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        terminal::print_reply(channel, text);
        Ok(())
    }

    async fn upload_file(&self, attachment: &Attachment) -> Result<()> {
        terminal::print_attachment(&attachment.filename, &attachment.comment, &attachment.content);
        Ok(())
    }
}

pub(super) async fn run(args: ExecArgs) -> Result<()> {
    if args.text.trim().is_empty() {
        bail!("nothing to run, try `clusterbot exec help`");
    }
    let config = load_config(args.config).await?;
    logging::init(config.logging.max_level(), LogTarget::Stderr);

    let workflows = load_workflows(&config).await?;
    let bot = build_bot(&config, Arc::new(DryRunManager::default()), workflows);
    let event = ChatEvent {
        user: args.user,
        channel: args.channel,
        text: args.text,
    };
    let replies = bot.handle(&event).await;
    deliver_replies(&ConsoleSink, &event.channel, &replies).await;
    Ok(())
}
