mod exec;
mod serve;

use anyhow::Result;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::commands::ChatBot;
use crate::core::config::BotConfig;
use crate::core::manager::JobManager;
use crate::core::terminal::GuideSection;
use crate::core::workflow::{WorkflowConfig, WorkflowStore};

fn print_help() {
    println!(
        "\n {} {}",
        style("clusterbot").bold().cyan(),
        env!("CARGO_PKG_VERSION")
    );

    GuideSection::new("Commands")
        .command("serve", "Run the Slack webhook and job notifier")
        .command("exec", "Run one chat command locally and print the replies")
        .command("version", "Print the version")
        .command("help", "Show this message")
        .print();

    GuideSection::new("Flags")
        .command("--config <path>", "Config file (default $CLUSTERBOT_CONFIG)")
        .command("--listen <addr>", "serve: webhook listen address")
        .command("--user <id>", "exec: user the command is sent as")
        .command("--channel <id>", "exec: channel the command is sent from")
        .print();

    println!(
        "\n {} {} <command> [flags]\n",
        style("Usage:").bold(),
        style("clusterbot").green()
    );
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ServeArgs {
    pub config: Option<PathBuf>,
    pub listen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExecArgs {
    pub config: Option<PathBuf>,
    pub user: String,
    pub channel: String,
    pub text: String,
}

/// Read `--flag value` at `args[i]`, returning the value and the next index.
fn flag_value(args: &[String], i: usize) -> (Option<String>, usize) {
    if i + 1 < args.len() {
        (Some(args[i + 1].clone()), i + 2)
    } else {
        (None, i + 1)
    }
}

pub(crate) fn parse_serve_args(args: &[String], start: usize) -> ServeArgs {
    let mut parsed = ServeArgs::default();
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let (value, next) = flag_value(args, i);
                parsed.config = value.map(PathBuf::from).or(parsed.config);
                i = next;
            }
            "--listen" | "-l" => {
                let (value, next) = flag_value(args, i);
                parsed.listen = value.or(parsed.listen);
                i = next;
            }
            _ => i += 1,
        }
    }
    parsed
}

/// Flags may appear anywhere; every other word becomes the command text.
pub(crate) fn parse_exec_args(args: &[String], start: usize) -> ExecArgs {
    let mut parsed = ExecArgs {
        config: None,
        user: "local-user".to_string(),
        channel: "D-local".to_string(),
        text: String::new(),
    };
    let mut words = Vec::new();
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let (value, next) = flag_value(args, i);
                parsed.config = value.map(PathBuf::from).or(parsed.config);
                i = next;
            }
            "--user" | "-u" => {
                let (value, next) = flag_value(args, i);
                if let Some(user) = value {
                    parsed.user = user;
                }
                i = next;
            }
            "--channel" => {
                let (value, next) = flag_value(args, i);
                if let Some(channel) = value {
                    parsed.channel = channel;
                }
                i = next;
            }
            word => {
                words.push(word.to_string());
                i += 1;
            }
        }
    }
    parsed.text = words.join(" ");
    parsed
}

pub(crate) async fn load_config(path: Option<PathBuf>) -> Result<BotConfig> {
    let path = path.unwrap_or_else(BotConfig::default_path);
    let mut config = BotConfig::load(&path).await?;
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

pub(crate) async fn load_workflows(config: &BotConfig) -> Result<WorkflowStore> {
    match &config.workflows.path {
        Some(path) => Ok(WorkflowStore::new(WorkflowConfig::load(path).await?)),
        None => Ok(WorkflowStore::default()),
    }
}

pub(crate) fn build_bot(
    config: &BotConfig,
    manager: Arc<dyn JobManager>,
    workflows: WorkflowStore,
) -> ChatBot {
    ChatBot::new(manager, workflows, Arc::new(config.catalog.clone()))
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("serve") => serve::run(parse_serve_args(&args, 2)).await,
        Some("exec") => exec::run(parse_exec_args(&args, 2)).await,
        Some("version") | Some("--version") | Some("-V") => {
            println!("clusterbot {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        _ => {
            print_help();
            Ok(())
        }
    }
}
