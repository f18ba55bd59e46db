// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deadline timer and the watchdog wrapper used by transitions.

use parking_lot::Mutex;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

enum Command {
    Schedule {
        deadline: Instant,
        callback: Box<dyn FnOnce() + Send>,
    },
    Cancel,
}

/// One-shot timer with a dedicated dispatch thread.
///
/// `expire_in` schedules a callback; `cancel` is idempotent and drops
/// a pending callback; dropping the timer cancels. A cancelled
/// callback is never invoked. Callbacks run on the timer thread and
/// must not block.
pub struct DeadlineTimer {
    tx: Option<mpsc::Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl DeadlineTimer {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<Command>();
        let worker = std::thread::spawn(move || Self::dispatch(&rx));
        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    fn dispatch(rx: &mpsc::Receiver<Command>) {
        let mut pending: Option<(Instant, Box<dyn FnOnce() + Send>)> = None;
        loop {
            match pending.take() {
                None => match rx.recv() {
                    Ok(Command::Schedule { deadline, callback }) => {
                        pending = Some((deadline, callback));
                    }
                    Ok(Command::Cancel) => {}
                    Err(_) => return,
                },
                Some((deadline, callback)) => {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    match rx.recv_timeout(wait) {
                        Err(mpsc::RecvTimeoutError::Timeout) => callback(),
                        Ok(Command::Schedule {
                            deadline: next_deadline,
                            callback: next_callback,
                        }) => pending = Some((next_deadline, next_callback)),
                        Ok(Command::Cancel) => {}
                        // timer dropped mid-wait: the callback must not fire
                        Err(mpsc::RecvTimeoutError::Disconnected) => return,
                    }
                }
            }
        }
    }

    /// Schedule `callback` to run once after `after`. A second call
    /// replaces a still-pending callback.
    pub fn expire_in(&self, after: Duration, callback: impl FnOnce() + Send + 'static) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Command::Schedule {
                deadline: Instant::now() + after,
                callback: Box::new(callback),
            });
        }
    }

    pub fn cancel(&self) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Command::Cancel);
        }
    }
}

impl Default for DeadlineTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Watchdog around a transition call: fires a warning callback once
/// when the configured timeout elapses. The running work is never
/// interrupted; `stop` merely disarms the watchdog.
pub struct ExecutionTimer {
    timeout: Duration,
    callback: Option<Arc<dyn Fn() + Send + Sync>>,
    timer: Mutex<Option<DeadlineTimer>>,
}

impl ExecutionTimer {
    /// Timer that never fires, for calls without a watchdog.
    pub fn disabled() -> Self {
        Self {
            timeout: Duration::ZERO,
            callback: None,
            timer: Mutex::new(None),
        }
    }

    pub fn new(timeout: Duration, callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            timeout,
            callback: Some(Arc::new(callback)),
            timer: Mutex::new(None),
        }
    }

    /// Arm (or re-arm) the watchdog.
    pub fn start(&self) {
        if let Some(callback) = &self.callback {
            let timer = DeadlineTimer::new();
            let callback = Arc::clone(callback);
            timer.expire_in(self.timeout, move || callback());
            *self.timer.lock() = Some(timer);
        }
    }

    /// Disarm; a pending callback will not fire.
    pub fn stop(&self) {
        self.timer.lock().take();
    }
}

impl Drop for ExecutionTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
