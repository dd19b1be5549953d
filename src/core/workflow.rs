use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::catalog::Catalog;
use super::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub platform: String,
    #[serde(default)]
    pub architecture: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub workflows: HashMap<String, WorkflowDefinition>,
}

impl WorkflowConfig {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading workflow config {}", path.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing workflow config {}", path.display()))?;
        Ok(config)
    }
}

/// Platform and architecture a workflow launch inherits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWorkflow {
    pub platform: String,
    pub architecture: String,
}

/// Shared handle to the workflow map. Command handling only reads it.
#[derive(Clone, Default)]
pub struct WorkflowStore {
    inner: Arc<RwLock<WorkflowConfig>>,
}

impl WorkflowStore {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub async fn resolve(&self, name: &str, catalog: &Catalog) -> Result<ResolvedWorkflow, ParseError> {
        let config = self.inner.read().await;
        let workflow = config
            .workflows
            .get(name)
            .ok_or_else(|| ParseError::UnknownWorkflow(name.to_string()))?;

        let architecture = match workflow.architecture.as_deref() {
            None | Some("") => catalog.default_architecture.clone(),
            Some(arch) if catalog.is_architecture(arch) => arch.to_string(),
            Some(arch) => return Err(ParseError::UnsupportedArchitecture(arch.to_string())),
        };
        Ok(ResolvedWorkflow {
            platform: workflow.platform.clone(),
            architecture,
        })
    }

    pub async fn names(&self) -> Vec<String> {
        let config = self.inner.read().await;
        let mut names: Vec<String> = config.workflows.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn replace(&self, config: WorkflowConfig) {
        *self.inner.write().await = config;
    }

    /// Reload from disk. On failure the current map is left in place.
    pub async fn reload_from(&self, path: &Path) -> Result<usize> {
        let config = WorkflowConfig::load(path).await?;
        let count = config.workflows.len();
        self.replace(config).await;
        Ok(count)
    }
}

/// Periodically re-read the workflow file until `cancel` fires.
pub fn spawn_reloader(
    store: WorkflowStore,
    path: PathBuf,
    every: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // the first tick completes immediately and the caller already loaded once
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Workflow reloader stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match store.reload_from(&path).await {
                        Ok(count) => info!("Reloaded {} workflows from {}", count, path.display()),
                        Err(e) => warn!("Keeping previous workflows, reload failed: {:#}", e),
                    }
                }
            }
        }
    })
}

/// Parse `"KEY=VALUE","KEY2=VALUE2"` into a map.
///
/// Splits on the literal `","` and trims one quote off the outer ends, so a
/// value that itself contains `","` is not supported.
pub fn parse_workflow_params(input: &str) -> Result<BTreeMap<String, String>, ParseError> {
    let mut params = BTreeMap::new();
    if input.is_empty() {
        return Ok(params);
    }
    let mut pieces: Vec<&str> = input.split("\",\"").collect();
    let first = pieces[0];
    pieces[0] = first.strip_prefix('"').unwrap_or(first);
    let last_index = pieces.len() - 1;
    let last = pieces[last_index];
    pieces[last_index] = last.strip_suffix('"').unwrap_or(last);
    for piece in pieces {
        let split: Vec<&str> = piece.split('=').collect();
        if split.len() != 2 {
            return Err(ParseError::MalformedWorkflowParam(piece.to_string()));
        }
        params.insert(split[0].to_string(), split[1].to_string());
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(entries: &[(&str, &str, Option<&str>)]) -> WorkflowStore {
        let workflows = entries
            .iter()
            .map(|(name, platform, arch)| {
                (
                    name.to_string(),
                    WorkflowDefinition {
                        platform: platform.to_string(),
                        architecture: arch.map(str::to_string),
                    },
                )
            })
            .collect();
        WorkflowStore::new(WorkflowConfig { workflows })
    }

    #[test]
    fn workflow_params_strip_outer_quotes() {
        let params = parse_workflow_params("\"A=1\",\"B=two\"").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["A"], "1");
        assert_eq!(params["B"], "two");
    }

    #[test]
    fn workflow_params_single_and_empty() {
        assert_eq!(parse_workflow_params("\"A=1\"").unwrap()["A"], "1");
        assert_eq!(parse_workflow_params("A=1").unwrap()["A"], "1");
        assert!(parse_workflow_params("").unwrap().is_empty());
    }

    #[test]
    fn workflow_params_require_key_value() {
        let err = parse_workflow_params("\"A=1\",\"B\"").unwrap_err();
        assert_eq!(err, ParseError::MalformedWorkflowParam("B".to_string()));
        let err = parse_workflow_params("\"A=1=2\"").unwrap_err();
        assert_eq!(err, ParseError::MalformedWorkflowParam("A=1=2".to_string()));
        assert!(err.to_string().contains("form of KEY=VALUE"));
    }

    #[test]
    fn workflow_params_do_not_split_on_plain_commas() {
        let err = parse_workflow_params("\"A=1,B=2\"").unwrap_err();
        assert_eq!(err, ParseError::MalformedWorkflowParam("A=1,B=2".to_string()));
    }

    #[tokio::test]
    async fn resolve_inherits_platform_and_architecture() {
        let store = store_with(&[
            ("ipi-aws", "aws", None),
            ("ipi-arm", "aws", Some("arm64")),
            ("ipi-ppc", "aws", Some("ppc64le")),
        ]);
        let catalog = Catalog::default();

        let plain = store.resolve("ipi-aws", &catalog).await.unwrap();
        assert_eq!(plain.platform, "aws");
        assert_eq!(plain.architecture, "amd64");

        let arm = store.resolve("ipi-arm", &catalog).await.unwrap();
        assert_eq!(arm.architecture, "arm64");

        let err = store.resolve("ipi-ppc", &catalog).await.unwrap_err();
        assert_eq!(err.to_string(), "Architecture ppc64le not supported by cluster-bot");
    }

    #[tokio::test]
    async fn resolve_unknown_workflow() {
        let store = store_with(&[]);
        let err = store.resolve("nope", &Catalog::default()).await.unwrap_err();
        assert_eq!(err, ParseError::UnknownWorkflow("nope".to_string()));
    }

    #[tokio::test]
    async fn reload_replaces_map_and_keeps_it_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workflows.yaml");
        std::fs::write(
            &path,
            "workflows:\n  ipi-gcp:\n    platform: gcp\n  upi-metal:\n    platform: metal\n    architecture: arm64\n",
        )
        .unwrap();

        let store = WorkflowStore::default();
        assert_eq!(store.reload_from(&path).await.unwrap(), 2);
        assert_eq!(store.names().await, vec!["ipi-gcp", "upi-metal"]);

        std::fs::write(&path, "workflows: [not, a, map").unwrap();
        assert!(store.reload_from(&path).await.is_err());
        assert_eq!(store.names().await.len(), 2);
    }
}
