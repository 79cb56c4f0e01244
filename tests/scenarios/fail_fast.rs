//! Test: Fail Fast - the first failing step ends the job

use crate::helpers::*;
use merge_gate::core::config::WorkflowConfig;
use merge_gate::core::{StepState, Workflow};
use merge_gate::execution::ExecutionEvent;

fn three_step_workflow() -> Workflow {
    let yaml = r#"
name: CI
on:
  push:
    branches: [main]
jobs:
  lint:
    steps:
      - uses: checkout@v1
      - name: first
        run: cargo check
      - name: second
        run: cargo clippy
      - name: third
        run: cargo fmt --check
"#;
    Workflow::from_config(&WorkflowConfig::from_yaml(yaml).unwrap()).unwrap()
}

#[tokio::test]
async fn test_steps_after_failure_never_run() {
    let shell = ScriptedShell::new().fails("cargo clippy", 101, "error: lint\n");
    let mut engine = engine(gate_registry(&shell));
    let events = EventLog::attach(&mut engine);

    let run = run_workflow(&engine, &three_step_workflow(), push("main")).await;

    assert_job_failed_at(&run, "lint", "second");
    assert_eq!(shell.scripts_for("lint"), vec!["cargo check", "cargo clippy"]);
    match &step(&run, "lint", "third").state {
        StepState::Skipped { reason } => assert!(reason.contains("second")),
        other => panic!("unexpected state {:?}", other),
    }

    let skipped: Vec<_> = events
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ExecutionEvent::StepSkipped { step, .. } => Some(step),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec!["third"]);
}

#[tokio::test]
async fn test_failing_setup_action_skips_everything_after_it() {
    let shell = ScriptedShell::new();
    let registry = gate_registry(&shell).with(StaticAction::failing(
        "toolchain",
        1,
        "error: toolchain '1.75.0' is not installable\n",
    ));
    let engine = engine(registry);

    let run = run_workflow(&engine, &Workflow::default_gate().unwrap(), push("main")).await;

    assert_job_failed_at(&run, "lint", "Run toolchain@v1");
    assert_job_failed_at(&run, "build", "Run toolchain@v1");
    assert!(shell.calls().is_empty());
}

/// Action errors, not only non-zero exits, fail the step
#[tokio::test]
async fn test_step_without_workspace_fails() {
    let yaml = r#"
name: CI
on:
  push:
    branches: [main]
jobs:
  build:
    steps:
      - uses: cache@v1
      - run: cargo test
"#;
    let workflow = Workflow::from_config(&WorkflowConfig::from_yaml(yaml).unwrap()).unwrap();
    let shell = ScriptedShell::new();

    let run = run_workflow(&engine(gate_registry(&shell)), &workflow, push("main")).await;

    assert_job_failed_at(&run, "build", "Run cache@v1");
    match &step(&run, "build", "Run cache@v1").state {
        StepState::Failed {
            error, exit_code, ..
        } => {
            assert!(error.contains("no workspace"));
            assert!(exit_code.is_none());
        }
        other => panic!("unexpected state {:?}", other),
    }
    assert!(shell.calls().is_empty());
}
