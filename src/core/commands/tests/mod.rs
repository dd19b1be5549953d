mod requests;

use std::sync::Arc;

use super::{ChatBot, ChatEvent};
use crate::core::catalog::Catalog;
use crate::core::manager::DryRunManager;
use crate::core::workflow::{WorkflowConfig, WorkflowDefinition, WorkflowStore};

fn dm(text: &str) -> ChatEvent {
    ChatEvent {
        user: "U123".to_string(),
        channel: "D456".to_string(),
        text: text.to_string(),
    }
}

fn workflows() -> WorkflowStore {
    let mut config = WorkflowConfig::default();
    config.workflows.insert(
        "ipi-aws".to_string(),
        WorkflowDefinition {
            platform: "aws".to_string(),
            architecture: None,
        },
    );
    config.workflows.insert(
        "ipi-aws-arm".to_string(),
        WorkflowDefinition {
            platform: "aws".to_string(),
            architecture: Some("arm64".to_string()),
        },
    );
    config.workflows.insert(
        "ipi-power".to_string(),
        WorkflowDefinition {
            platform: "powervs".to_string(),
            architecture: Some("ppc64le".to_string()),
        },
    );
    WorkflowStore::new(config)
}

fn bot() -> (ChatBot, Arc<DryRunManager>) {
    let manager = Arc::new(DryRunManager::default());
    let bot = ChatBot::new(manager.clone(), workflows(), Arc::new(Catalog::default()));
    (bot, manager)
}
