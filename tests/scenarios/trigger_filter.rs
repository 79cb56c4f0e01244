//! Test: Trigger Filter - which events start the gate

use crate::helpers::*;
use merge_gate::core::config::WorkflowConfig;
use merge_gate::core::{TriggerDecision, Workflow, WorkflowStatus};
use merge_gate::execution::ExecutionEvent;

/// Pushes to branches outside main/auto/canary never instantiate a job
#[tokio::test]
async fn test_push_to_other_branch_instantiates_nothing() {
    let shell = ScriptedShell::new();
    let checkout = FakeCheckout::new();
    let mut engine = engine(gate_registry(&shell).with(checkout.clone()));
    let events = EventLog::attach(&mut engine);
    let workflow = Workflow::default_gate().unwrap();

    for branch in ["feature/login", "develop", "mainline", "release/1.0"] {
        let run = run_workflow(&engine, &workflow, push(branch)).await;
        assert_eq!(run.status, WorkflowStatus::Skipped, "push to {}", branch);
        assert!(run.jobs.is_empty());
        assert_eq!(run.exit_code(), 0);
    }

    assert!(shell.calls().is_empty());
    assert_eq!(checkout.checkouts(), 0);
    assert!(events
        .events()
        .iter()
        .all(|e| matches!(e, ExecutionEvent::WorkflowSkipped { .. })));
}

/// Pull requests targeting anything but main never instantiate a job
#[tokio::test]
async fn test_pull_request_to_other_target_instantiates_nothing() {
    let shell = ScriptedShell::new();
    let engine = engine(gate_registry(&shell));
    let workflow = Workflow::default_gate().unwrap();

    for target in ["develop", "auto", "canary", "release/1.0"] {
        let run = run_workflow(&engine, &workflow, pull_request("feature/x", target)).await;
        assert_eq!(run.status, WorkflowStatus::Skipped, "pull request into {}", target);
        assert!(run.jobs.is_empty());
        match &run.decision {
            TriggerDecision::Skip { reason } => assert!(reason.contains(target)),
            TriggerDecision::Run => panic!("pull request into {} should be skipped", target),
        }
    }
    assert!(shell.calls().is_empty());
}

#[tokio::test]
async fn test_gated_events_run_both_jobs() {
    let shell = ScriptedShell::new();
    let engine = engine(gate_registry(&shell));
    let workflow = Workflow::default_gate().unwrap();

    let events = [
        push("main"),
        push("auto"),
        push("canary"),
        push("refs/heads/main"),
        pull_request("feature/x", "main"),
    ];
    for event in events {
        let run = run_workflow(&engine, &workflow, event.clone()).await;
        assert_eq!(run.status, WorkflowStatus::Succeeded, "{}", event);
        assert_eq!(job_ids(&run), vec!["lint", "build"]);
    }
}

#[tokio::test]
async fn test_workflow_file_can_widen_the_filter() {
    let yaml = r#"
name: Nightly
on:
  push:
    branches: ["release/*"]
jobs:
  build:
    steps:
      - run: cargo build
"#;
    let config = WorkflowConfig::from_yaml(yaml).unwrap();
    let workflow = Workflow::from_config(&config).unwrap();
    let shell = ScriptedShell::new();
    let engine = engine(gate_registry(&shell));

    let run = run_workflow(&engine, &workflow, push("release/1.2")).await;
    assert_eq!(run.status, WorkflowStatus::Succeeded);
    assert_eq!(shell.scripts_for("build"), vec!["cargo build"]);

    let run = run_workflow(&engine, &workflow, push("release/1.2/hotfix")).await;
    assert_eq!(run.status, WorkflowStatus::Skipped);

    let run = run_workflow(&engine, &workflow, pull_request("release/1.2", "main")).await;
    assert_eq!(run.status, WorkflowStatus::Skipped);
}
