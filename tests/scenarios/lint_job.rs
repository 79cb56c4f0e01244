//! Test: Lint Job - analyzer, formatter and diff check

use crate::helpers::*;
use merge_gate::action::{DiffCheck, ShellCommand};
use merge_gate::core::config::WorkflowConfig;
use merge_gate::core::{StepState, Workflow, WorkflowStatus};

const CLIPPY_WARNING: &str = "\
warning: unused variable: `x`
 --> src/lib.rs:2:9
  |
  = note: `-D unused-variables` implied by `-D warnings`
error: could not compile `sample` due to previous warning
";

#[tokio::test]
async fn test_clean_lint_job_runs_every_step_in_order() {
    let shell = ScriptedShell::new();
    let engine = engine(gate_registry(&shell));
    let workflow = Workflow::default_gate().unwrap();

    let run = run_workflow(&engine, &workflow, push("main")).await;

    assert_job_succeeded(&run, "lint");
    assert_eq!(
        shell.scripts_for("lint"),
        vec![
            "cargo clippy --all-features --all-targets -- -D warnings",
            "cargo fmt --all -- --check",
        ]
    );
}

/// An analyzer warning fails the job even though formatting is clean
#[tokio::test]
async fn test_analyzer_warning_fails_lint() {
    let shell = ScriptedShell::new().fails("cargo clippy", 101, CLIPPY_WARNING);
    let engine = engine(gate_registry(&shell));
    let workflow = Workflow::default_gate().unwrap();

    let run = run_workflow(&engine, &workflow, push("main")).await;

    assert_eq!(run.status, WorkflowStatus::Failed);
    assert_eq!(run.exit_code(), 1);
    assert_job_failed_at(&run, "lint", "Lint (clippy)");

    match &step(&run, "lint", "Lint (clippy)").state {
        StepState::Failed {
            exit_code, output, ..
        } => {
            assert_eq!(*exit_code, Some(101));
            assert!(output.contains("unused variable"));
        }
        other => panic!("unexpected state {:?}", other),
    }
}

/// The analyzer failure decides the outcome whatever the formatter would say
#[tokio::test]
async fn test_analyzer_warning_fails_lint_with_bad_formatting_too() {
    let shell = ScriptedShell::new()
        .fails("cargo clippy", 101, CLIPPY_WARNING)
        .fails("cargo fmt", 1, "Diff in src/lib.rs at line 1\n");
    let engine = engine(gate_registry(&shell));
    let workflow = Workflow::default_gate().unwrap();

    let run = run_workflow(&engine, &workflow, push("main")).await;

    assert_job_failed_at(&run, "lint", "Lint (clippy)");
    assert!(!shell.scripts_for("lint").iter().any(|s| s.starts_with("cargo fmt")));
}

#[tokio::test]
async fn test_formatting_violation_fails_lint() {
    let shell = ScriptedShell::new().fails("cargo fmt", 1, "Diff in src/lib.rs at line 1\n");
    let engine = engine(gate_registry(&shell));
    let workflow = Workflow::default_gate().unwrap();

    let run = run_workflow(&engine, &workflow, push("main")).await;

    assert_job_failed_at(&run, "lint", "Lint (rustfmt)");
    assert_job_succeeded(&run, "build");
}

/// The formatter passes but leaves the tree modified; the diff check catches it
#[tokio::test]
async fn test_diff_check_catches_tree_changed_by_earlier_step() {
    if !git_available() {
        return;
    }

    let yaml = r#"
name: CI
on:
  push:
    branches: [main]
jobs:
  lint:
    name: Lint
    steps:
      - uses: checkout@v1
      - name: Lint (rustfmt)
        run: printf '\n// reformatted\n' >> src/lib.rs
      - name: Check for diffs
        uses: diff-check@v1
"#;
    let workflow = Workflow::from_config(&WorkflowConfig::from_yaml(yaml).unwrap()).unwrap();
    let registry = gate_registry(&ScriptedShell::new())
        .with(FakeCheckout::new().with_git())
        .with(ShellCommand::default())
        .with(DiffCheck);
    let engine = engine(registry);

    let run = run_workflow(&engine, &workflow, push("main")).await;

    assert!(step(&run, "lint", "Lint (rustfmt)").state.is_passed());
    assert_job_failed_at(&run, "lint", "Check for diffs");
    match &step(&run, "lint", "Check for diffs").state {
        StepState::Failed { output, .. } => assert!(output.contains("src/lib.rs")),
        other => panic!("unexpected state {:?}", other),
    }
}

#[tokio::test]
async fn test_diff_check_passes_on_untouched_tree() {
    if !git_available() {
        return;
    }

    let yaml = r#"
name: CI
on:
  push:
    branches: [main]
jobs:
  lint:
    steps:
      - uses: checkout@v1
      - run: cat src/lib.rs
      - uses: diff-check@v1
"#;
    let workflow = Workflow::from_config(&WorkflowConfig::from_yaml(yaml).unwrap()).unwrap();
    let registry = gate_registry(&ScriptedShell::new())
        .with(FakeCheckout::new().with_git())
        .with(ShellCommand::default())
        .with(DiffCheck);

    let run = run_workflow(&engine(registry), &workflow, push("main")).await;
    assert_job_succeeded(&run, "lint");
}
