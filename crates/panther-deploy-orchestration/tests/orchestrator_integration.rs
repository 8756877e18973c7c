//! Full-graph deployments against a fake provisioning backend

mod common;

use common::{FakeBuilder, FakeProvisioner, Harness};
use panther_deploy_config::DeploySettings;
use panther_deploy_orchestration::{
    BuildStep, DeployError, DeployOrchestrator, DeploymentGraph, Phase, ProgressReporter, StackId,
    StackNode,
};

fn orchestrator(harness: &Harness) -> DeployOrchestrator {
    DeployOrchestrator::new(
        harness.deployer(DeploySettings::default()),
        DeploymentGraph::standard(),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_deploy_succeeds() {
    let harness = Harness::new(FakeProvisioner::healthy());

    let report = orchestrator(&harness).deploy_all().await.unwrap();

    assert_eq!(report.stacks, StackId::ALL.len());
    assert_eq!(report.outputs.get("LoadBalancerUrl"), "web-123.elb.amazonaws.com");
    assert_eq!(report.outputs.get("CoreQueueUrl"), "https://sqs/core");

    let deployed = harness.provisioner.deployed_ids();
    assert_eq!(deployed.len(), StackId::ALL.len());
    assert_eq!(&deployed[..2], &[StackId::Bootstrap, StackId::Gateway]);
    // Phase B only starts after phase A has joined
    let position = |id| deployed.iter().position(|d| *d == id).unwrap();
    for later in [StackId::Frontend, StackId::Onboard] {
        for earlier in [
            StackId::Appsync,
            StackId::CloudSecurity,
            StackId::Core,
            StackId::Dashboards,
            StackId::LogAnalysis,
        ] {
            assert!(position(earlier) < position(later));
        }
    }
}

#[tokio::test]
async fn test_downstream_stacks_read_bootstrap_outputs() {
    let harness = Harness::new(FakeProvisioner::healthy());
    orchestrator(&harness).deploy_all().await.unwrap();

    let bootstrap = harness.provisioner.spec(StackId::Bootstrap).unwrap();
    assert_eq!(bootstrap.artifact_bucket, None);

    let core = harness.provisioner.spec(StackId::Core).unwrap();
    assert_eq!(core.artifact_bucket.as_deref(), Some("panther-source"));
    assert_eq!(core.parameters["UserPoolId"], "us-east-1_pool");
    assert_eq!(core.parameters["CustomResourceVersion"], "v1.2.3");

    let appsync = harness.provisioner.spec(StackId::Appsync).unwrap();
    assert_eq!(appsync.parameters["AnalysisApi"], "https://analysis.execute-api");

    let log_analysis = harness.provisioner.spec(StackId::LogAnalysis).unwrap();
    assert_eq!(log_analysis.parameters["TablesSignature"], "tables-sig");

    let web = harness.provisioner.spec(StackId::Frontend).unwrap();
    assert_eq!(web.parameters["Image"], "1.dkr.ecr/panther-web:v1.2.3-4-gabcdef0");
}

#[tokio::test]
async fn test_builds_run_once_per_step() {
    let harness = Harness::new(FakeProvisioner::healthy());
    orchestrator(&harness).deploy_all().await.unwrap();

    let steps = harness.builder.steps();
    for step in BuildStep::ALL {
        assert_eq!(steps.iter().filter(|s| **s == step).count(), 1, "{}", step);
    }
    assert_eq!(&steps[..2], &[BuildStep::Api, BuildStep::Lambda]);
    assert_eq!(harness.builder.images().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_failures_wait_for_siblings() {
    let provisioner = FakeProvisioner::healthy()
        .failing(StackId::Appsync, "bad parameter")
        .failing(StackId::Dashboards, "bad template")
        .delayed(StackId::LogAnalysis, 50)
        .delayed(StackId::CloudSecurity, 30);
    let harness = Harness::new(provisioner);

    let err = orchestrator(&harness).deploy_all().await.unwrap_err();

    match err {
        DeployError::StacksFailed { count, failed, .. } => {
            assert_eq!(count, 2);
            assert!(failed.contains(&"panther-appsync".to_string()));
            assert!(failed.contains(&"panther-cw-dashboards".to_string()));
        }
        other => panic!("unexpected error: {}", other),
    }

    // Slow siblings still finished, and phase B still ran
    let deployed = harness.provisioner.deployed_ids();
    assert!(deployed.contains(&StackId::LogAnalysis));
    assert!(deployed.contains(&StackId::CloudSecurity));
    assert!(deployed.contains(&StackId::Frontend));
    assert!(deployed.contains(&StackId::Onboard));
}

#[tokio::test]
async fn test_core_failure_skips_frontend_only() {
    let harness = Harness::new(FakeProvisioner::healthy().failing(StackId::Core, "rollback"));

    let err = orchestrator(&harness).deploy_all().await.unwrap_err();

    match err {
        DeployError::StacksFailed { count, failed, .. } => {
            assert_eq!(count, 2);
            assert_eq!(failed, vec!["panther-core", "panther-web"]);
        }
        other => panic!("unexpected error: {}", other),
    }

    let deployed = harness.provisioner.deployed_ids();
    assert!(!deployed.contains(&StackId::Frontend));
    assert!(deployed.contains(&StackId::Onboard));
    assert!(harness.builder.images().is_empty());
}

#[tokio::test]
async fn test_bootstrap_failure_is_fatal() {
    let harness = Harness::new(FakeProvisioner::healthy().failing(StackId::Bootstrap, "denied"));

    let err = orchestrator(&harness).deploy_all().await.unwrap_err();

    assert!(matches!(err, DeployError::Provisioning { ref stack, .. } if stack == "panther-bootstrap"));
    assert_eq!(harness.provisioner.deployed_ids(), vec![StackId::Bootstrap]);
}

#[tokio::test]
async fn test_bootstrap_output_collision_is_fatal() {
    let provisioner = FakeProvisioner::healthy()
        .with_outputs(StackId::Gateway, &[("SourceBucket", "other-bucket")]);
    let harness = Harness::new(provisioner);

    let err = orchestrator(&harness).deploy_all().await.unwrap_err();

    assert!(matches!(
        err,
        DeployError::OutputCollision { ref key, ref stack }
            if key == "SourceBucket" && stack == "panther-bootstrap-gateway"
    ));
    assert_eq!(
        harness.provisioner.deployed_ids(),
        vec![StackId::Bootstrap, StackId::Gateway]
    );
}

#[tokio::test]
async fn test_output_collision_is_counted_as_a_failure() {
    let provisioner = FakeProvisioner::healthy()
        .with_outputs(StackId::Gateway, &[("SourceBucket", "other-bucket")]);
    let harness = Harness::new(provisioner);
    let orchestrator = orchestrator(&harness);
    let mut reporter = ProgressReporter::new("deploy", orchestrator.graph().total_stacks());

    let err = orchestrator
        .deploy_with_progress(&mut reporter)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::OutputCollision { .. }));
    assert_eq!(reporter.completed(), 2);
    assert_eq!(reporter.succeeded(), ["panther-bootstrap"]);
    assert_eq!(reporter.failed_count(), 1);
    assert_eq!(reporter.failures()[0].0, "panther-bootstrap-gateway");
    assert!(reporter.failures()[0].1.contains("SourceBucket"));
}

#[tokio::test]
async fn test_artifact_failure_stops_before_any_stack() {
    let harness = Harness::with_builder(
        FakeProvisioner::healthy(),
        FakeBuilder::failing(BuildStep::Lambda),
    );

    let err = orchestrator(&harness).deploy_all().await.unwrap_err();

    assert!(matches!(err, DeployError::Artifact(_)));
    assert!(harness.provisioner.deployed_ids().is_empty());
}

#[tokio::test]
async fn test_onboard_disabled_deletes_stack() {
    let harness = Harness::new(FakeProvisioner::healthy());
    let mut settings = DeploySettings::default();
    settings.setup.onboard_self = false;

    DeployOrchestrator::new(harness.deployer(settings), DeploymentGraph::standard())
        .deploy_all()
        .await
        .unwrap();

    assert_eq!(harness.provisioner.deleted(), vec!["panther-onboard"]);
    assert!(!harness.provisioner.deployed_ids().contains(&StackId::Onboard));
}

#[tokio::test]
async fn test_python_layer_built_unless_configured() {
    let harness = Harness::new(FakeProvisioner::healthy());
    orchestrator(&harness).deploy_all().await.unwrap();
    assert_eq!(*harness.packager.calls.lock().unwrap(), 1);
    assert!(harness.dir.path().join("layer.zip").exists());

    let harness = Harness::new(FakeProvisioner::healthy());
    let mut settings = DeploySettings::default();
    settings.infra.python_layer_version_arn = "arn:aws:lambda:layer:custom".into();
    DeployOrchestrator::new(harness.deployer(settings), DeploymentGraph::standard())
        .deploy_all()
        .await
        .unwrap();
    assert_eq!(*harness.packager.calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_custom_graph_drives_ordering() {
    let harness = Harness::new(FakeProvisioner::healthy());
    let graph = DeploymentGraph::new(vec![
        Phase::serial(vec![StackNode::new(StackId::Bootstrap, &[])]),
        Phase::parallel(vec![StackNode::new(StackId::Dashboards, &[StackId::Bootstrap])]),
    ])
    .unwrap();

    let report = DeployOrchestrator::new(harness.deployer(DeploySettings::default()), graph)
        .deploy_all()
        .await
        .unwrap();

    assert_eq!(report.stacks, 2);
    assert_eq!(
        harness.provisioner.deployed_ids(),
        vec![StackId::Bootstrap, StackId::Dashboards]
    );
}
