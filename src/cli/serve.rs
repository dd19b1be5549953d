use anyhow::{Result, bail};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{ServeArgs, build_bot, load_config, load_workflows};
use crate::core::manager::{DryRunManager, JobManager};
use crate::core::workflow::spawn_reloader;
use crate::interfaces::ChatSink;
use crate::interfaces::notifier::spawn_notifier;
use crate::interfaces::slack::{self, SlackClient, SlackState};
use crate::logging::{self, LogTarget};

pub(super) async fn run(args: ServeArgs) -> Result<()> {
    let config = load_config(args.config).await?;
    logging::init(config.logging.max_level(), LogTarget::Stdout);

    if config.slack.bot_token.is_empty() {
        bail!("no Slack bot token configured, set SLACK_BOT_TOKEN or [slack].bot_token");
    }

    let cancel = CancellationToken::new();
    let workflows = load_workflows(&config).await?;
    if let (Some(path), Some(every)) = (&config.workflows.path, config.workflows.reload_interval()) {
        spawn_reloader(workflows.clone(), path.clone(), every, cancel.clone());
    }

    let manager: Arc<dyn JobManager> = Arc::new(DryRunManager::default());
    warn!("Using the dry-run job manager, requests are recorded but nothing is provisioned");

    let sink: Arc<dyn ChatSink> = Arc::new(SlackClient::new(
        config.slack.api_base.clone(),
        config.slack.bot_token.clone(),
    ));
    let notifier = spawn_notifier(manager.clone(), sink.clone(), cancel.clone());

    let state = SlackState {
        bot: Arc::new(build_bot(&config, manager, workflows)),
        sink,
        signing_secret: config.slack.signing_secret.clone(),
    };

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            shutdown.cancel();
        }
    });

    let listen = args.listen.unwrap_or_else(|| config.slack.listen.clone());
    let served = slack::serve(&listen, state, cancel.clone()).await;
    cancel.cancel();
    notifier.await.ok();
    served
}
