//! Scenario-based tests for merge-gate

mod build_and_test;
mod cache_sharing;
mod fail_fast;
mod lint_job;
mod trigger_filter;
