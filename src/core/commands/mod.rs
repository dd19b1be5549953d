mod requests;
mod table;

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::catalog::Catalog;
use crate::core::error::CommandError;
use crate::core::manager::JobManager;
use crate::core::notify::{self, Notification};
use crate::core::text::{code_list, is_direct_message, parse_image_input, strip_links};
use crate::core::workflow::WorkflowStore;

use table::{COMMANDS, Command, Slots, find_command};

pub const UNRECOGNIZED_COMMAND: &str =
    "unrecognized command, msg me `help` for a list of all commands";

/// A chat message addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub user: String,
    pub channel: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain text answer in the channel the command came from.
    Text(String),
    /// A rendered job notification, possibly with a credentials file.
    Notification(Notification),
}

pub struct ChatBot {
    manager: Arc<dyn JobManager>,
    workflows: WorkflowStore,
    catalog: Arc<Catalog>,
}

impl ChatBot {
    pub fn new(manager: Arc<dyn JobManager>, workflows: WorkflowStore, catalog: Arc<Catalog>) -> Self {
        Self {
            manager,
            workflows,
            catalog,
        }
    }

    /// Run one command. Failures come back as a text reply, never as an error.
    pub async fn handle(&self, event: &ChatEvent) -> Vec<Reply> {
        let event = ChatEvent {
            text: strip_links(event.text.trim()),
            ..event.clone()
        };
        let Some((command, slots)) = find_command(&event.text) else {
            info!("Unrecognized command from {}: {}", event.user, event.text);
            return vec![Reply::Text(UNRECOGNIZED_COMMAND.to_string())];
        };
        info!("{:?} from {} in {}", command, event.user, event.channel);

        match self.dispatch(command, &slots, &event).await {
            Ok(replies) => replies,
            Err(e) => {
                warn!("{:?} from {} failed: {}", command, event.user, e);
                vec![Reply::Text(e.to_string())]
            }
        }
    }

    async fn dispatch(&self, command: Command, slots: &Slots, event: &ChatEvent) -> Result<Vec<Reply>> {
        let catalog = self.catalog.as_ref();
        let built = match command {
            Command::Lookup => {
                let from = parse_image_input(slots.get("image_or_version_or_pr"))?;
                let msg = self.manager.lookup_inputs(&from).await?;
                return Ok(vec![Reply::Text(msg)]);
            }
            Command::List => {
                return Ok(vec![Reply::Text(self.manager.list_jobs(&event.user).await)]);
            }
            Command::Refresh => {
                require_direct(event, CommandError::DirectMessageRequired)?;
                let msg = self.manager.sync_job_for_user(&event.user).await?;
                return Ok(vec![Reply::Text(msg)]);
            }
            Command::Done => {
                require_direct(event, CommandError::DirectMessageRequired)?;
                let msg = self.manager.terminate_job_for_user(&event.user).await?;
                return Ok(vec![Reply::Text(msg)]);
            }
            Command::Auth => {
                require_direct(event, CommandError::DirectMessageRequired)?;
                let mut job = self.manager.get_launch_job(&event.user).await?;
                job.requested_channel = event.channel.clone();
                return Ok(vec![Reply::Notification(notify::format(&job, Utc::now()))]);
            }
            Command::Version => {
                return Ok(vec![Reply::Text(format!(
                    "Running `clusterbot {}`",
                    env!("CARGO_PKG_VERSION")
                ))]);
            }
            Command::Help => return Ok(vec![Reply::Text(self.help())]),
            Command::Launch => {
                require_direct(event, CommandError::NotDirectMessage)?;
                requests::launch(
                    catalog,
                    event,
                    slots.get("image_or_version_or_pr"),
                    slots.get("options"),
                )?
            }
            Command::Test => {
                require_direct(event, CommandError::NotDirectMessage)?;
                requests::test(
                    catalog,
                    event,
                    slots.get("name"),
                    slots.get("image_or_version_or_pr"),
                    slots.get("options"),
                )?
            }
            Command::TestUpgrade => {
                require_direct(event, CommandError::NotDirectMessage)?;
                requests::upgrade(
                    catalog,
                    event,
                    slots.get("from"),
                    slots.get("to"),
                    slots.get("options"),
                )?
            }
            Command::Build => {
                require_direct(event, CommandError::NotDirectMessage)?;
                requests::build(catalog, event, slots.get("pullrequest"), slots.get("options"))?
            }
            Command::WorkflowLaunch => {
                require_direct(event, CommandError::NotDirectMessage)?;
                requests::workflow_launch(
                    catalog,
                    &self.workflows,
                    event,
                    slots.get("name"),
                    slots.get("image_or_version_or_pr"),
                    slots.get("parameters"),
                )
                .await?
            }
        };

        let mut replies: Vec<Reply> = built.warnings.into_iter().map(Reply::Text).collect();
        let msg = self.manager.launch_job_for_user(built.request).await?;
        replies.push(Reply::Text(msg));
        Ok(replies)
    }

    pub fn help(&self) -> String {
        let catalog = self.catalog.as_ref();
        let mut lines = vec!["Commands:".to_string()];
        for spec in COMMANDS {
            lines.push(format!("• `{}` - {}", spec.usage, describe(spec.command, catalog)));
        }
        lines.join("\n")
    }
}

fn require_direct(event: &ChatEvent, err: CommandError) -> Result<(), CommandError> {
    if is_direct_message(&event.channel) {
        Ok(())
    } else {
        Err(err)
    }
}

fn describe(command: Command, catalog: &Catalog) -> String {
    match command {
        Command::Launch => format!(
            "Launch a cluster from a known image, version, or PR. You may omit both arguments. Options is a comma-delimited list of variations including platform ({}), architecture ({}) and parameters ({}).",
            code_list(&catalog.platforms),
            code_list(&catalog.architectures),
            code_list(&catalog.parameters)
        ),
        Command::Lookup => "Get info about a version.".to_string(),
        Command::List => "See who is hogging all the clusters.".to_string(),
        Command::Refresh => "If the cluster is currently marked as failed, retry fetching its credentials in case of an error.".to_string(),
        Command::Done => "Terminate the running cluster.".to_string(),
        Command::Auth => "Send the credentials for the cluster you most recently requested.".to_string(),
        Command::TestUpgrade => format!(
            "Run the upgrade tests between two release images. You may change the upgrade test by passing `test=NAME` in options with one of {}.",
            code_list(&catalog.upgrade_tests)
        ),
        Command::Test => format!(
            "Run the requested test suite from an image, release or built PRs. Supported test suites are {}.",
            code_list(&catalog.tests)
        ),
        Command::Build => "Create a new release image from one or more pull requests.".to_string(),
        Command::WorkflowLaunch => "Launch a cluster using the requested workflow from an image, release or built PRs. Parameters are a comma-separated list of quoted `\"KEY=VALUE\"` pairs.".to_string(),
        Command::Version => "Report the version of the bot.".to_string(),
        Command::Help => "Show this list.".to_string(),
    }
}

#[cfg(test)]
mod tests;
