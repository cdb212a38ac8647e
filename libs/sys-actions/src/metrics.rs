#![allow(missing_docs)] // proc macros dont play nicely with docstrings

//! Action-local metrics, lazily initialized on first access.
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, register_int_counter_vec};
use prometheus_static_metric::make_static_metric;

make_static_metric! {
    pub label_enum ActionKind {
        restart,
        status,
        backup,
        wifi,
        shutdown,
    }
    pub struct ActionRuns: IntCounter {
        "action" => ActionKind
    }
    pub struct ActionFailures: IntCounter {
        "action" => ActionKind
    }
}

lazy_static! {
    pub static ref ACTION_RUNS_VEC: IntCounterVec = register_int_counter_vec!(
        "action_runs",
        "count of invoked system actions",
        &["action"]
    )
    .unwrap();
    pub static ref ACTION_FAILURES_VEC: IntCounterVec = register_int_counter_vec!(
        "action_failures",
        "count of failed system actions",
        &["action"]
    )
    .unwrap();

    /// every invocation, by action
    pub static ref ACTION_RUNS: ActionRuns = ActionRuns::from(&ACTION_RUNS_VEC);

    /// failed invocations, by action
    pub static ref ACTION_FAILURES: ActionFailures = ActionFailures::from(&ACTION_FAILURES_VEC);
}
