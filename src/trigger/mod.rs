//! trigger - Cancellable recurring timers
//!
//! # Architecture
//!
//! A [`TimerSet`] issues a [`TriggerHandle`] for every recurring tokio task it
//! spawns and is the only owner of their cancellation. Components that need a
//! family of polls (the login coordinator, the element interceptor) each own
//! one set and hand clones of its `Arc` to whoever may need to stop it.
//!
//! # Invariants
//!
//! - The first tick of an interval fires one period after registration
//! - After [`TimerSet::cancel_all`] no tick of any handle from this set runs,
//!   and new registrations are refused
//! - A tick that returns [`ControlFlow::Break`] ends its own task only
//! - Cancellation stops future ticks; it never interrupts a tick in progress
//!
//! # Example
//!
//! ```
//! use std::ops::ControlFlow;
//! use std::time::Duration;
//! use sso_bridge::trigger::TimerSet;
//!
//! # tokio_test::block_on(async {
//! let timers = TimerSet::new();
//! let handle = timers
//!     .spawn_interval("poll", Duration::from_millis(10), || ControlFlow::Continue(()))
//!     .unwrap();
//! assert_eq!(timers.active(), 1);
//!
//! timers.cancel(handle);
//! timers.cancel_all();
//! assert!(timers.is_cancelled());
//! assert_eq!(timers.active(), 0);
//! # });
//! ```

use std::collections::HashMap;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Opaque identifier of one recurring timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerHandle(u64);

#[derive(Default)]
struct TimerInner {
    next_id: u64,
    tasks: HashMap<u64, (&'static str, AbortHandle)>,
    cancelled: bool,
}

impl TimerInner {
    fn is_live(&self, id: u64) -> bool {
        !self.cancelled && self.tasks.contains_key(&id)
    }
}

/// Owner of a family of recurring timers.
#[derive(Default)]
pub struct TimerSet {
    inner: Arc<Mutex<TimerInner>>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `tick` every `period` until it breaks or the handle is cancelled.
    ///
    /// Returns `None` when the set has been cancelled, `period` is zero, or
    /// no tokio runtime is available.
    pub fn spawn_interval<F>(
        &self,
        name: &'static str,
        period: Duration,
        mut tick: F,
    ) -> Option<TriggerHandle>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        if period.is_zero() {
            tracing::warn!(trigger = name, "zero period; timer not started");
            return None;
        }
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!(trigger = name, "no tokio runtime; timer not started");
                return None;
            }
        };

        // Held across spawn so the task cannot deregister before it is registered.
        let mut inner = self.inner.lock().ok()?;
        if inner.cancelled {
            tracing::debug!(trigger = name, "timer set cancelled; refusing registration");
            return None;
        }
        inner.next_id += 1;
        let id = inner.next_id;

        let shared = Arc::clone(&self.inner);
        let task = runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let live = shared.lock().map(|i| i.is_live(id)).unwrap_or(false);
                if !live || tick().is_break() {
                    break;
                }
            }
            if let Ok(mut inner) = shared.lock() {
                inner.tasks.remove(&id);
            }
            tracing::trace!(trigger = name, "timer finished");
        });

        inner.tasks.insert(id, (name, task.abort_handle()));
        tracing::debug!(trigger = name, period_ms = period.as_millis() as u64, "timer started");
        Some(TriggerHandle(id))
    }

    /// Stop one timer. Unknown or finished handles are ignored.
    pub fn cancel(&self, handle: TriggerHandle) {
        let removed = self
            .inner
            .lock()
            .ok()
            .and_then(|mut inner| inner.tasks.remove(&handle.0));
        if let Some((name, task)) = removed {
            task.abort();
            tracing::debug!(trigger = name, "timer cancelled");
        }
    }

    /// Stop every timer and refuse new ones. Idempotent.
    pub fn cancel_all(&self) {
        let tasks: Vec<(&'static str, AbortHandle)> = match self.inner.lock() {
            Ok(mut inner) => {
                if inner.cancelled && inner.tasks.is_empty() {
                    return;
                }
                inner.cancelled = true;
                inner.tasks.drain().map(|(_, task)| task).collect()
            }
            Err(_) => return,
        };
        for (_, task) in &tasks {
            task.abort();
        }
        tracing::debug!(count = tasks.len(), "all timers cancelled");
    }

    /// Number of timers still registered.
    pub fn active(&self) -> usize {
        self.inner.lock().map(|i| i.tasks.len()).unwrap_or(0)
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.lock().map(|i| i.cancelled).unwrap_or(true)
    }

    /// Names of the timers still registered, sorted.
    pub fn active_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .inner
            .lock()
            .map(|i| i.tasks.values().map(|(name, _)| *name).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for TimerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerSet")
            .field("active", &self.active_names())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
