//! Test: Build-and-Test Job - test outcomes and job independence

use crate::helpers::*;
use merge_gate::core::{Workflow, WorkflowStatus};
use merge_gate::execution::ExecutionEvent;
use std::time::Duration;

const ONE_FAILING_TEST: &str = "\
running 3 tests
test tests::adds ... ok
test tests::always_false ... FAILED
test tests::answers ... ok

failures:

---- tests::always_false stdout ----
thread 'tests::always_false' panicked at src/lib.rs:12:9:
assertion failed: false

failures:
    tests::always_false

test result: FAILED. 2 passed; 1 failed; 0 ignored
";

#[tokio::test]
async fn test_passing_suite_succeeds() {
    let shell = ScriptedShell::new();
    let engine = engine(gate_registry(&shell));
    let workflow = Workflow::default_gate().unwrap();

    let run = run_workflow(&engine, &workflow, push("main")).await;

    assert_job_succeeded(&run, "build");
    assert_eq!(shell.scripts_for("build"), vec!["cargo test --all-features"]);
    assert_eq!(
        step(&run, "build", "Run tests").state.output().map(|o| o.contains("ok")),
        Some(true)
    );
}

/// One always-false assertion fails the job and is named in the report
#[tokio::test]
async fn test_failing_test_is_reported_by_name() {
    let shell = ScriptedShell::new().fails("cargo test", 101, ONE_FAILING_TEST);
    let engine = engine(gate_registry(&shell));
    let workflow = Workflow::default_gate().unwrap();

    let run = run_workflow(&engine, &workflow, push("main")).await;

    assert_eq!(run.status, WorkflowStatus::Failed);
    assert_job_failed_at(&run, "build", "Run tests");
    assert_eq!(
        failing_tests(&run, "build", "Run tests"),
        &["tests::always_false".to_string()]
    );
}

/// Both jobs run to completion; one failing does not stop the other
#[tokio::test]
async fn test_jobs_complete_independently() {
    let shell = ScriptedShell::new()
        .fails("cargo test", 101, ONE_FAILING_TEST)
        .with_delay(Duration::from_millis(20));
    let checkout = FakeCheckout::new();
    let mut engine = engine(gate_registry(&shell).with(checkout.clone()));
    let events = EventLog::attach(&mut engine);
    let workflow = Workflow::default_gate().unwrap();

    let run = run_workflow(&engine, &workflow, push("main")).await;

    assert_job_failed_at(&run, "build", "Run tests");
    assert_job_succeeded(&run, "lint");
    assert_eq!(checkout.checkouts(), 2);
    assert_eq!(run.exit_code(), 1);

    // Both jobs were in flight before either finished
    let events = events.events();
    let first_finish = events
        .iter()
        .position(|e| matches!(e, ExecutionEvent::JobFinished { .. }))
        .unwrap();
    let starts = events[..first_finish]
        .iter()
        .filter(|e| matches!(e, ExecutionEvent::JobStarted { .. }))
        .count();
    assert_eq!(starts, 2);
}

#[tokio::test]
async fn test_job_selection_runs_only_named_jobs() {
    let shell = ScriptedShell::new();
    let engine = engine(gate_registry(&shell));
    let workflow = Workflow::default_gate().unwrap();

    let run = engine
        .run(
            &workflow,
            &push("main"),
            &merge_gate::core::RepoSource::new(".", "HEAD"),
            &["build".to_string()],
        )
        .await
        .unwrap();

    assert_eq!(job_ids(&run), vec!["build"]);
    assert!(shell.scripts_for("lint").is_empty());

    let unknown = engine
        .run(
            &workflow,
            &push("main"),
            &merge_gate::core::RepoSource::new(".", "HEAD"),
            &["deploy".to_string()],
        )
        .await;
    assert!(unknown.is_err());
}
