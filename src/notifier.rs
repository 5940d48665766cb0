//! Wake-one notifiers for subscriber threads
//!
//! A subscriber thread that has drained its queue parks in
//! [`Notifier::wait_for`]; the publishing side calls [`Notifier::notify`]
//! after each push. Multiple subscriber queues may share one notifier.
//! [`Notifier::shutdown`] wakes the waiter and latches a forced timeout that
//! overrides caller-supplied durations from that point on, so a thread stuck
//! on a long wait starts cycling quickly during teardown.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Wake-one primitive bound to subscriber queues.
///
/// `notify` called before `wait_for` must not be lost; spurious wake-ups are
/// permitted.
pub trait Notifier: Send + Sync {
    /// Notifier name, for diagnostics ("polling", "cv", ...)
    fn name(&self) -> &str;

    /// Block the caller for up to `timeout` (or the forced shutdown timeout,
    /// once one is latched)
    fn wait_for(&self, timeout: Duration);

    /// Wake at most one waiter. Called from the push path.
    fn notify(&self) {}

    /// Wake the waiter and force `timeout` onto all subsequent waits
    fn shutdown(&self, timeout: Duration) {
        let _ = timeout;
    }
}

/// Polling notifier: `wait_for` just sleeps.
///
/// `notify` and `shutdown` are no-ops; a polling subscriber rediscovers queue
/// state on its own schedule.
#[derive(Debug, Default)]
pub struct PollingNotifier;

impl PollingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for PollingNotifier {
    fn name(&self) -> &str {
        "polling"
    }

    fn wait_for(&self, timeout: Duration) {
        std::thread::sleep(timeout);
    }
}

#[derive(Debug, Default)]
struct CondvarState {
    /// Pending notifications; nonzero means a wake arrived before the wait
    count: u32,
    /// Forced timeout latched by shutdown
    forced: Option<Duration>,
}

/// Condition-variable notifier.
///
/// Keeps a pending-notification count so a `notify` that races ahead of the
/// matching `wait_for` is never lost.
#[derive(Debug, Default)]
pub struct CondvarNotifier {
    state: Mutex<CondvarState>,
    cv: Condvar,
}

impl CondvarNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for CondvarNotifier {
    fn name(&self) -> &str {
        "cv"
    }

    fn wait_for(&self, timeout: Duration) {
        let state = self.state.lock().unwrap();
        let effective = state.forced.unwrap_or(timeout);
        let (mut state, _timed_out) = self
            .cv
            .wait_timeout_while(state, effective, |s| s.count == 0)
            .unwrap();
        state.count = 0;
    }

    fn notify(&self) {
        let mut state = self.state.lock().unwrap();
        state.count += 1;
        drop(state);
        self.cv.notify_one();
    }

    fn shutdown(&self, timeout: Duration) {
        let mut state = self.state.lock().unwrap();
        state.count += 1;
        state.forced = Some(timeout);
        drop(state);
        self.cv.notify_one();
    }
}
