//! Test: Cache Sharing - content-addressed entries reused across runs

use crate::helpers::*;
use merge_gate::cache::{DependencyCache, FsCache, PutOutcome};
use merge_gate::core::{RepoSource, Workflow};
use merge_gate::execution::ExecutionEvent;
use std::sync::Arc;

fn fs_cache(root: &std::path::Path) -> FsCache {
    FsCache::new(root.join("cache")).unwrap()
}

#[tokio::test]
async fn test_second_run_restores_first_runs_artifacts() {
    let root = tempfile::tempdir().unwrap();
    let cache = fs_cache(root.path());
    let lint_key = expected_cache_key("lint");
    let build_key = expected_cache_key("build");
    let workflow = Workflow::default_gate().unwrap();

    // First run: both jobs miss and each populates its own entry
    let shell = ScriptedShell::new();
    let mut first = engine_with_cache(gate_registry(&shell), Arc::new(cache.clone()));
    let first_events = EventLog::attach(&mut first);
    let run = run_workflow(&first, &workflow, push("main")).await;
    assert_eq!(run.exit_code(), 0);

    assert_ne!(lint_key, build_key);
    assert_eq!(first_events.cache_lookups("lint"), vec![(lint_key.to_string(), false)]);
    assert_eq!(first_events.cache_lookups("build"), vec![(build_key.to_string(), false)]);
    assert!(cache.contains(&lint_key));
    assert!(cache.contains(&build_key));

    let mut saved: Vec<(String, PutOutcome)> = first_events
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ExecutionEvent::CacheSaved { job_id, outcome, .. } => Some((job_id, outcome)),
            _ => None,
        })
        .collect();
    saved.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        saved,
        vec![
            ("build".to_string(), PutOutcome::Stored),
            ("lint".to_string(), PutOutcome::Stored),
        ]
    );

    // Each entry holds the artifacts of the job that produced it
    for (job, key) in [("lint", &lint_key), ("build", &build_key)] {
        let dest = tempfile::tempdir().unwrap();
        cache.get(key, dest.path()).await.unwrap();
        let artifact = std::fs::read_to_string(dest.path().join("target/debug/sample.d")).unwrap();
        assert_eq!(artifact, format!("built by {}\n", job));
    }

    // Second run: every job hits
    let shell = ScriptedShell::new();
    let mut second = engine_with_cache(gate_registry(&shell), Arc::new(cache.clone()));
    let second_events = EventLog::attach(&mut second);
    let run = run_workflow(&second, &workflow, push("main")).await;
    assert_eq!(run.exit_code(), 0);

    assert_eq!(second_events.cache_lookups("lint"), vec![(lint_key.to_string(), true)]);
    assert_eq!(second_events.cache_lookups("build"), vec![(build_key.to_string(), true)]);
    let restored = step(&run, "build", "Run cache@v1").state.output().unwrap_or_default();
    assert!(restored.contains("Cache restored from key"));
}

#[tokio::test]
async fn test_failed_job_does_not_populate_cache() {
    let root = tempfile::tempdir().unwrap();
    let cache = fs_cache(root.path());
    let key = expected_cache_key("build");

    let shell = ScriptedShell::new().fails("cargo test", 101, "test tests::broken ... FAILED\n");
    let engine = engine_with_cache(gate_registry(&shell), Arc::new(cache.clone()));
    let run = engine
        .run(
            &Workflow::default_gate().unwrap(),
            &push("main"),
            &RepoSource::new(".", "HEAD"),
            &["build".to_string()],
        )
        .await
        .unwrap();

    assert_job_failed_at(&run, "build", "Run tests");
    assert!(!cache.contains(&key));

    let dest = tempfile::tempdir().unwrap();
    let lookup = cache.get(&key, dest.path()).await.unwrap();
    assert_eq!(lookup, merge_gate::cache::CacheLookup::Miss);
}

#[tokio::test]
async fn test_changed_manifest_changes_key() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    write_crate(a.path());
    write_crate(b.path());
    std::fs::write(
        b.path().join("Cargo.lock"),
        format!("{}\n[[package]]\nname = \"serde\"\nversion = \"1.0.0\"\n", CARGO_LOCK),
    )
    .unwrap();

    let key_a = merge_gate::cache::CacheKey::compute("cargo-build", a.path(), "default").unwrap();
    let key_b = merge_gate::cache::CacheKey::compute("cargo-build", b.path(), "default").unwrap();
    assert_ne!(key_a, key_b);
    assert_eq!(key_a, expected_cache_key("build"));
}
