//! User-facing failures. The `Display` text of every variant is sent back to
//! the requesting user verbatim.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("image inputs must not contain empty items")]
    EmptyInputItem,
    #[error("you may only specify one platform in options")]
    DuplicatePlatform,
    #[error("you may only specify one architecture in options")]
    DuplicateArchitecture,
    #[error("unrecognized option: {0}")]
    UnrecognizedOption(String),
    #[error(
        "Unable to interpret `{0}` as a parameter. Please ensure that all parameters are in the form of KEY=VALUE"
    )]
    MalformedWorkflowParam(String),
    #[error(
        "Workflow {0} not in workflow list. Please add {0} to the workflows list before retrying this command"
    )]
    UnknownWorkflow(String),
    #[error("Architecture {0} not supported by cluster-bot")]
    UnsupportedArchitecture(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("this command is only accepted via direct message")]
    NotDirectMessage,
    #[error("you must direct message me this request")]
    DirectMessageRequired,
    #[error("you must specify what will be tested")]
    NothingToTest,
    #[error("you must specify an image to upgrade from and to")]
    MissingUpgradeSource,
    #[error("you must specify at least one pull request to build a release image")]
    MissingBuildInput,
    #[error("you must specify the name of a test: {0}")]
    MissingTestName(String),
    #[error("you must specify the name of a workflow: {0}")]
    MissingWorkflowName(String),
    #[error("Test arguments may not be passed from the launch command")]
    ReservedTestParameter,
    #[error("Upgrade type tests require the 'test upgrade' command")]
    UpgradeSuiteNeedsUpgradeCommand,
    #[error("Only upgrade type tests may be run from this command")]
    NotAnUpgradeSuite,
}
