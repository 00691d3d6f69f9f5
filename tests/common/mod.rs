//! Shared test utilities: a deterministic scheduler, a call log, and
//! hand-driven foreign thenables.

#![allow(dead_code, unused_imports)]

use deferred::{Callback, Scheduler, TaskQueue, Thenable};
use parking_lot::Mutex;
use std::sync::Arc;

pub type CallLog = Arc<Mutex<Vec<String>>>;

/// A scheduler backed by a queue the test drains explicitly.
pub fn queue_scheduler() -> (TaskQueue, Scheduler) {
    let queue = TaskQueue::new();
    let scheduler = Scheduler::from(queue.clone());
    (queue, scheduler)
}

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().clone()
}

/// One thing a [`ScriptedThenable`] does when registered.
#[derive(Debug, Clone)]
pub enum Step {
    Fulfill(i32),
    Reject(String),
    /// Return `Err` from `register` right here.
    Fail(String),
}

/// Foreign thenable that replays `steps` synchronously inside `register`.
///
/// Unlike a well-behaved thenable it happily calls both callbacks.
pub struct ScriptedThenable {
    steps: Vec<Step>,
}

impl ScriptedThenable {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }
}

impl Thenable<i32, String> for ScriptedThenable {
    fn register(
        self: Box<Self>,
        on_fulfilled: Callback<i32>,
        on_rejected: Callback<String>,
    ) -> Result<(), String> {
        let mut on_fulfilled = Some(on_fulfilled);
        let mut on_rejected = Some(on_rejected);
        for step in self.steps {
            match step {
                Step::Fulfill(value) => {
                    if let Some(callback) = on_fulfilled.take() {
                        callback(value);
                    }
                }
                Step::Reject(reason) => {
                    if let Some(callback) = on_rejected.take() {
                        callback(reason);
                    }
                }
                Step::Fail(reason) => return Err(reason),
            }
        }
        Ok(())
    }
}

type Callbacks = (Callback<i32>, Callback<String>);

/// Foreign thenable whose callbacks are fired later through a [`ManualTrigger`].
pub struct ManualThenable {
    slot: Arc<Mutex<Option<Callbacks>>>,
}

/// Fires the callbacks captured by a [`ManualThenable`].
#[derive(Clone)]
pub struct ManualTrigger {
    slot: Arc<Mutex<Option<Callbacks>>>,
}

pub fn manual_thenable() -> (ManualThenable, ManualTrigger) {
    let slot = Arc::new(Mutex::new(None));
    (
        ManualThenable {
            slot: Arc::clone(&slot),
        },
        ManualTrigger { slot },
    )
}

impl Thenable<i32, String> for ManualThenable {
    fn register(
        self: Box<Self>,
        on_fulfilled: Callback<i32>,
        on_rejected: Callback<String>,
    ) -> Result<(), String> {
        *self.slot.lock() = Some((on_fulfilled, on_rejected));
        Ok(())
    }
}

impl ManualTrigger {
    pub fn is_registered(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub fn fulfill(&self, value: i32) {
        let callbacks = self.slot.lock().take();
        if let Some((on_fulfilled, _)) = callbacks {
            on_fulfilled(value);
        }
    }

    pub fn reject(&self, reason: &str) {
        let callbacks = self.slot.lock().take();
        if let Some((_, on_rejected)) = callbacks {
            on_rejected(reason.to_string());
        }
    }
}
