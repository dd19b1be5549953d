use super::{dm, workflows};
use crate::core::catalog::Catalog;
use crate::core::commands::requests;
use crate::core::error::{CommandError, ParseError};
use crate::core::job::JobType;

#[test]
fn launch_without_inputs_has_no_groups() {
    let built = requests::launch(&Catalog::default(), &dm("launch"), "", "").unwrap();
    assert!(built.request.inputs.is_empty());
    assert_eq!(built.request.job_type, JobType::Launch);
    assert_eq!(built.request.platform, "gcp");
    assert_eq!(built.request.architecture, "amd64");
}

#[test]
fn launch_keeps_parameters_and_extracts_selectors() {
    let built =
        requests::launch(&Catalog::default(), &dm("launch 4.15 aws,arm64,ovn"), "4.15", "aws,arm64,ovn")
            .unwrap();
    assert_eq!(built.request.inputs, vec![vec!["4.15".to_string()]]);
    assert_eq!(built.request.platform, "aws");
    assert_eq!(built.request.architecture, "arm64");
    assert_eq!(built.request.job_params.keys().collect::<Vec<_>>(), vec!["ovn"]);
    assert_eq!(built.request.original_message, "launch 4.15 aws,arm64,ovn");
}

#[test]
fn launch_rejects_test_parameter() {
    let err = requests::launch(&Catalog::default(), &dm(""), "4.15", "test=e2e").unwrap_err();
    assert_eq!(err, CommandError::ReservedTestParameter);
    // a bare `test` token carries no suite and is let through
    assert!(requests::launch(&Catalog::default(), &dm(""), "4.15", "test").is_ok());
}

#[test]
fn test_requires_target_and_name() {
    let catalog = Catalog::default();
    assert_eq!(
        requests::test(&catalog, &dm(""), "e2e", "", "").unwrap_err(),
        CommandError::NothingToTest
    );
    let err = requests::test(&catalog, &dm(""), "", "4.15", "").unwrap_err();
    assert!(err.to_string().starts_with("you must specify the name of a test: `e2e`"));
}

#[test]
fn test_places_suite_in_params() {
    let built = requests::test(&Catalog::default(), &dm(""), "e2e-serial", "4.15", "azure").unwrap();
    assert_eq!(built.request.job_params["test"], "e2e-serial");
    assert_eq!(built.request.platform, "azure");
    assert_eq!(built.request.job_type, JobType::Test);
    assert!(built.warnings.is_empty());
}

#[test]
fn test_name_overrides_option_test_value() {
    let built = requests::test(&Catalog::default(), &dm(""), "e2e", "4.15", "test=e2e-all").unwrap();
    assert_eq!(built.request.job_params["test"], "e2e");
}

#[test]
fn test_warns_on_custom_suite() {
    let built = requests::test(&Catalog::default(), &dm(""), "e2e-mine", "4.15", "").unwrap();
    assert_eq!(built.warnings.len(), 1);
    assert!(built.warnings[0].starts_with("warning: You are using a custom test name"));
}

#[test]
fn test_rejects_upgrade_suites() {
    let err = requests::test(&Catalog::default(), &dm(""), "e2e-upgrade", "4.15", "").unwrap_err();
    assert_eq!(err, CommandError::UpgradeSuiteNeedsUpgradeCommand);
}

#[test]
fn upgrade_defaults_target_and_suite() {
    let built = requests::upgrade(&Catalog::default(), &dm(""), "4.14", "", "").unwrap();
    assert_eq!(
        built.request.inputs,
        vec![vec!["4.14".to_string()], vec!["4.14".to_string()]]
    );
    assert_eq!(built.request.job_params["test"], "e2e-upgrade");
    assert_eq!(built.request.job_type, JobType::Upgrade);
}

#[test]
fn upgrade_accepts_explicit_upgrade_suite() {
    let built =
        requests::upgrade(&Catalog::default(), &dm(""), "4.14", "4.15", "test=e2e-upgrade-all,aws").unwrap();
    assert_eq!(built.request.inputs[1], vec!["4.15".to_string()]);
    assert_eq!(built.request.job_params["test"], "e2e-upgrade-all");
    assert_eq!(built.request.platform, "aws");
}

#[test]
fn upgrade_rejects_plain_suite_and_missing_source() {
    let catalog = Catalog::default();
    assert_eq!(
        requests::upgrade(&catalog, &dm(""), "4.14", "4.15", "test=e2e").unwrap_err(),
        CommandError::NotAnUpgradeSuite
    );
    assert_eq!(
        requests::upgrade(&catalog, &dm(""), "", "4.15", "").unwrap_err(),
        CommandError::MissingUpgradeSource
    );
}

#[test]
fn build_requires_pull_requests() {
    let catalog = Catalog::default();
    assert_eq!(
        requests::build(&catalog, &dm(""), " ", "").unwrap_err(),
        CommandError::MissingBuildInput
    );
    let built = requests::build(&catalog, &dm(""), "o/r#1,o/s#2", "").unwrap();
    assert_eq!(built.request.inputs[0].len(), 2);
    assert_eq!(built.request.job_type, JobType::Build);
}

#[test]
fn option_errors_surface_unchanged() {
    let err = requests::build(&Catalog::default(), &dm(""), "o/r#1", "gcp,aws").unwrap_err();
    assert_eq!(err, CommandError::Parse(ParseError::DuplicatePlatform));
    assert_eq!(err.to_string(), "you may only specify one platform in options");
}

#[tokio::test]
async fn workflow_launch_inherits_definition() {
    let built = requests::workflow_launch(
        &Catalog::default(),
        &workflows(),
        &dm(""),
        "ipi-aws-arm",
        "4.15",
        "\"FOO=bar\",\"BAZ=qux\"",
    )
    .await
    .unwrap();
    let request = built.request;
    assert_eq!(request.job_type, JobType::WorkflowLaunch);
    assert_eq!(request.platform, "aws");
    assert_eq!(request.architecture, "arm64");
    assert_eq!(request.workflow_name.as_deref(), Some("ipi-aws-arm"));
    assert_eq!(request.job_params["FOO"], "bar");
    assert_eq!(request.job_params["BAZ"], "qux");
}

#[tokio::test]
async fn workflow_launch_errors() {
    let catalog = Catalog::default();
    let store = workflows();

    let err = requests::workflow_launch(&catalog, &store, &dm(""), "missing", "4.15", "")
        .await
        .unwrap_err();
    assert_eq!(err, CommandError::Parse(ParseError::UnknownWorkflow("missing".to_string())));

    let err = requests::workflow_launch(&catalog, &store, &dm(""), "ipi-power", "4.15", "")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Architecture ppc64le not supported by cluster-bot");

    let err = requests::workflow_launch(&catalog, &store, &dm(""), "ipi-aws", "4.15", "\"NOPE\"")
        .await
        .unwrap_err();
    assert_eq!(err, CommandError::Parse(ParseError::MalformedWorkflowParam("NOPE".to_string())));

    let err = requests::workflow_launch(&catalog, &store, &dm(""), "", "4.15", "")
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "you must specify the name of a workflow: `ipi-aws`, `ipi-aws-arm`, `ipi-power`"
    );
}
