// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn ok_job(name: &str, runs: &Arc<AtomicU32>) -> TransitionJob {
    let runs = Arc::clone(runs);
    TransitionJob::new(name, move || {
        runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

fn failing_job(name: &str) -> TransitionJob {
    let name = name.to_string();
    TransitionJob::new(name.clone(), move || Err(format!("{name} refused")))
}

#[test]
fn serial_runs_all_jobs_in_order() {
    let runs = Arc::new(AtomicU32::new(0));
    let jobs = vec![ok_job("a", &runs), ok_job("b", &runs), ok_job("c", &runs)];
    assert!(run_serial(&jobs, &ExecutionTimer::disabled()));
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

#[test]
fn serial_stops_at_first_failure() {
    let runs = Arc::new(AtomicU32::new(0));
    let jobs = vec![ok_job("a", &runs), failing_job("b"), ok_job("c", &runs)];
    assert!(!run_serial(&jobs, &ExecutionTimer::disabled()));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(jobs[2].skipped());
    assert_eq!(jobs[1].error().unwrap(), "b refused");
}

#[test]
fn parallel_runs_everything_on_success() {
    let runs = Arc::new(AtomicU32::new(0));
    let jobs: Vec<_> = (0..16).map(|i| ok_job(&format!("p{i}"), &runs)).collect();
    assert!(run_parallel(&jobs, 4, &ExecutionTimer::disabled()));
    assert_eq!(runs.load(Ordering::SeqCst), 16);
    assert!(jobs.iter().all(|job| !job.skipped()));
}

// Property 4: after a failure is observed no queued job starts, but
// the policy still returns the composite outcome.
#[test]
fn parallel_short_circuits_after_failure() {
    let runs = Arc::new(AtomicU32::new(0));
    let mut jobs = vec![failing_job("first")];
    for i in 0..32 {
        jobs.push(ok_job(&format!("p{i}"), &runs));
    }
    // one worker: jobs run strictly after the failing first job
    assert!(!run_parallel(&jobs, 1, &ExecutionTimer::disabled()));
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert!(jobs[1..].iter().all(TransitionJob::skipped));
}

#[test]
fn parallel_reports_failure_from_any_worker() {
    let runs = Arc::new(AtomicU32::new(0));
    let jobs = vec![
        ok_job("a", &runs),
        ok_job("b", &runs),
        failing_job("c"),
        ok_job("d", &runs),
    ];
    assert!(!run_parallel(&jobs, 4, &ExecutionTimer::disabled()));
    assert_eq!(jobs[2].error().unwrap(), "c refused");
}

// Property 5: the watchdog fires exactly once on a slow cohort and the
// composite result is unaffected.
#[test]
fn timeout_is_advisory() {
    let fired = Arc::new(AtomicU32::new(0));
    let fired_in_callback = Arc::clone(&fired);
    let timer = ExecutionTimer::new(Duration::from_millis(30), move || {
        fired_in_callback.fetch_add(1, Ordering::SeqCst);
    });

    let jobs: Vec<_> = (0..2)
        .map(|i| {
            TransitionJob::new(format!("slow{i}"), || {
                std::thread::sleep(Duration::from_millis(120));
                Ok(())
            })
        })
        .collect();

    assert!(run_parallel(&jobs, 2, &timer));
    assert_eq!(fired.load(Ordering::SeqCst), 1, "watchdog fired once");
    assert!(jobs.iter().all(|job| !job.skipped()));
}

#[test]
fn fast_cohort_never_trips_the_watchdog() {
    let fired = Arc::new(AtomicU32::new(0));
    let fired_in_callback = Arc::clone(&fired);
    let timer = ExecutionTimer::new(Duration::from_millis(500), move || {
        fired_in_callback.fetch_add(1, Ordering::SeqCst);
    });
    let runs = Arc::new(AtomicU32::new(0));
    let jobs = vec![ok_job("a", &runs)];
    assert!(run_serial(&jobs, &timer));
    std::thread::sleep(Duration::from_millis(600));
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}
