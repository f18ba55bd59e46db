// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serial and parallel execution of one cohort's transition calls.

use crate::timer::ExecutionTimer;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One participant's transition call plus its recorded outcome.
pub struct TransitionJob {
    participant: String,
    work: Box<dyn Fn() -> Result<(), String> + Send + Sync>,
    outcome: Mutex<Option<Result<(), String>>>,
}

impl TransitionJob {
    pub fn new(
        participant: impl Into<String>,
        work: impl Fn() -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            participant: participant.into(),
            work: Box::new(work),
            outcome: Mutex::new(None),
        }
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    /// Run the call, record the outcome, report success.
    pub fn execute(&self) -> bool {
        let result = (self.work)();
        let ok = result.is_ok();
        *self.outcome.lock() = Some(result);
        ok
    }

    /// The recorded failure description, if this job ran and failed.
    pub fn error(&self) -> Option<String> {
        match &*self.outcome.lock() {
            Some(Err(description)) => Some(description.clone()),
            _ => None,
        }
    }

    /// True when the job never ran (e.g. skipped after a failure).
    pub fn skipped(&self) -> bool {
        self.outcome.lock().is_none()
    }
}

/// Run jobs one by one, stopping at the first failure.
pub fn run_serial(jobs: &[TransitionJob], timer: &ExecutionTimer) -> bool {
    timer.start();
    for job in jobs {
        if !job.execute() {
            return false;
        }
    }
    timer.stop();
    true
}

/// Run jobs on a pool of `thread_count` workers. A failure
/// short-circuits jobs that have not started yet; already-running jobs
/// complete. The pool is joined before returning.
pub fn run_parallel(jobs: &[TransitionJob], thread_count: u8, timer: &ExecutionTimer) -> bool {
    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(thread_count.max(1) as usize)
        .build()
    {
        Ok(pool) => pool,
        Err(error) => {
            tracing::warn!(%error, "worker pool unavailable, executing serially");
            return run_serial(jobs, timer);
        }
    };

    let success = Mutex::new(true);
    let next = AtomicUsize::new(0);
    timer.start();
    pool.scope(|scope| {
        for _ in 0..thread_count.max(1) {
            scope.spawn(|_| loop {
                // stop claiming jobs once a failure is observed;
                // already-running jobs cannot be cancelled
                if !*success.lock() {
                    return;
                }
                let index = next.fetch_add(1, Ordering::SeqCst);
                let Some(job) = jobs.get(index) else {
                    return;
                };
                let ok = job.execute();
                let mut flag = success.lock();
                *flag = *flag && ok;
            });
        }
    });
    timer.stop();
    success.into_inner()
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
