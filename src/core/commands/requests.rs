//! Per-command request builders. Each one checks the invariants of its command
//! shape and produces the request handed to the job manager.

use crate::core::catalog::{Catalog, DEFAULT_UPGRADE_TEST};
use crate::core::error::CommandError;
use crate::core::job::{JobRequest, JobType};
use crate::core::options::{ParsedOptions, parse_options};
use crate::core::text::{code_list, parse_image_input};
use crate::core::workflow::{WorkflowStore, parse_workflow_params};

use super::ChatEvent;

/// A request plus any warnings the user should see alongside the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Built {
    pub request: JobRequest,
    pub warnings: Vec<String>,
}

impl Built {
    fn new(request: JobRequest) -> Self {
        Self {
            request,
            warnings: Vec::new(),
        }
    }
}

fn request(
    event: &ChatEvent,
    job_type: JobType,
    inputs: Vec<Vec<String>>,
    options: ParsedOptions,
) -> JobRequest {
    JobRequest {
        original_message: event.text.clone(),
        user: event.user.clone(),
        channel: event.channel.clone(),
        inputs,
        job_type,
        platform: options.platform,
        architecture: options.architecture,
        job_params: options.params,
        workflow_name: None,
    }
}

fn has_test_param(options: &ParsedOptions) -> bool {
    options.params.get("test").is_some_and(|v| !v.is_empty())
}

/// `launch [inputs] [options]`: the input list may be empty.
pub fn launch(
    catalog: &Catalog,
    event: &ChatEvent,
    image: &str,
    options: &str,
) -> Result<Built, CommandError> {
    let from = parse_image_input(image)?;
    let inputs = if from.is_empty() { Vec::new() } else { vec![from] };

    let options = parse_options(options, catalog)?;
    if has_test_param(&options) {
        return Err(CommandError::ReservedTestParameter);
    }
    Ok(Built::new(request(event, JobType::Launch, inputs, options)))
}

/// `test <name> <inputs> [options]`: runs a non-upgrade suite.
pub fn test(
    catalog: &Catalog,
    event: &ChatEvent,
    name: &str,
    image: &str,
    options: &str,
) -> Result<Built, CommandError> {
    let from = parse_image_input(image)?;
    if from.is_empty() {
        return Err(CommandError::NothingToTest);
    }
    // chat dispatch never gets here: an empty name slot implies empty inputs
    if name.is_empty() {
        return Err(CommandError::MissingTestName(code_list(&catalog.tests)));
    }

    let mut options = parse_options(options, catalog)?;
    options.params.insert("test".to_string(), name.to_string());
    if name.contains("-upgrade") {
        return Err(CommandError::UpgradeSuiteNeedsUpgradeCommand);
    }

    let mut built = Built::new(request(event, JobType::Test, vec![from], options));
    if !catalog.is_test(name) {
        built.warnings.push(format!(
            "warning: You are using a custom test name, may not be supported for all platforms: {}",
            code_list(&catalog.tests)
        ));
    }
    Ok(built)
}

/// `test upgrade <from> [to] [options]`: `to` defaults to `from`.
pub fn upgrade(
    catalog: &Catalog,
    event: &ChatEvent,
    from: &str,
    to: &str,
    options: &str,
) -> Result<Built, CommandError> {
    let from = parse_image_input(from)?;
    if from.is_empty() {
        return Err(CommandError::MissingUpgradeSource);
    }
    let mut to = parse_image_input(to)?;
    if to.is_empty() {
        to = from.clone();
    }

    let mut options = parse_options(options, catalog)?;
    if !has_test_param(&options) {
        options
            .params
            .insert("test".to_string(), DEFAULT_UPGRADE_TEST.to_string());
    }
    if !options.params["test"].contains("-upgrade") {
        return Err(CommandError::NotAnUpgradeSuite);
    }
    Ok(Built::new(request(event, JobType::Upgrade, vec![from, to], options)))
}

/// `build <pull requests> [options]`
pub fn build(
    catalog: &Catalog,
    event: &ChatEvent,
    pulls: &str,
    options: &str,
) -> Result<Built, CommandError> {
    let from = parse_image_input(pulls)?;
    if from.is_empty() {
        return Err(CommandError::MissingBuildInput);
    }
    let options = parse_options(options, catalog)?;
    Ok(Built::new(request(event, JobType::Build, vec![from], options)))
}

/// `workflow-launch <name> <inputs> ["K=V","K2=V2"]`
///
/// Platform and architecture come from the workflow definition, not options.
pub async fn workflow_launch(
    catalog: &Catalog,
    workflows: &WorkflowStore,
    event: &ChatEvent,
    name: &str,
    image: &str,
    parameters: &str,
) -> Result<Built, CommandError> {
    let from = parse_image_input(image)?;
    if from.is_empty() {
        return Err(CommandError::NothingToTest);
    }
    // as in `test`, only reachable by calling the builder directly
    if name.is_empty() {
        return Err(CommandError::MissingWorkflowName(code_list(
            &workflows.names().await,
        )));
    }

    let resolved = workflows.resolve(name, catalog).await?;
    let job_params = parse_workflow_params(parameters)?;

    Ok(Built::new(JobRequest {
        original_message: event.text.clone(),
        user: event.user.clone(),
        channel: event.channel.clone(),
        inputs: vec![from],
        job_type: JobType::WorkflowLaunch,
        platform: resolved.platform,
        architecture: resolved.architecture,
        job_params,
        workflow_name: Some(name.to_string()),
    }))
}
