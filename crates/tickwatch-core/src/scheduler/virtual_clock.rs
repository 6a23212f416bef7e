// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A manually advanced scheduler for deterministic tests.

use super::{Scheduler, TaskHandle, TickCallback};
use crate::error::SchedulerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Virtual clock that only moves when told to.
///
/// Time starts at zero. [`advance`](Self::advance) moves it forward and runs
/// every tick that falls due on the way, synchronously, on the calling thread.
/// A task scheduled at time `t` has its first tick due at `t`; that tick runs
/// during the next `advance` or [`trigger`](Self::trigger), never from inside
/// [`schedule_periodic`](Scheduler::schedule_periodic). Ticks due at the same
/// instant run in scheduling order.
///
/// Cloning yields another handle to the same clock.
#[derive(Debug, Clone, Default)]
pub struct VirtualScheduler {
    inner: Arc<Mutex<VirtualState>>,
}

#[derive(Debug, Default)]
struct VirtualState {
    now: Duration,
    tasks: Vec<VirtualTask>,
    next_id: u64,
    capacity: Option<usize>,
}

struct VirtualTask {
    id: u64,
    period: Duration,
    next_due: Duration,
    next_tick: u64,
    cancelled: Arc<AtomicBool>,
    callback: Arc<Mutex<TickCallback>>,
}

impl std::fmt::Debug for VirtualTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualTask")
            .field("id", &self.id)
            .field("period", &self.period)
            .field("next_due", &self.next_due)
            .field("next_tick", &self.next_tick)
            .finish()
    }
}

impl VirtualScheduler {
    /// Creates a virtual clock at time zero with no task limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a virtual clock that refuses to run more than `limit` tasks
    /// at once.
    pub fn with_capacity(limit: usize) -> Self {
        let scheduler = Self::new();
        scheduler.state().capacity = Some(limit);
        scheduler
    }

    /// The virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.state().now
    }

    /// The number of tasks that have not been cancelled.
    pub fn active_tasks(&self) -> usize {
        self.state().tasks.len()
    }

    /// Moves the clock forward by `delta`, running every tick due up to and
    /// including the new time.
    pub fn advance(&self, delta: Duration) {
        let target = self.now().saturating_add(delta);
        self.run_until(target);
    }

    /// Moves the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    /// Runs the ticks that are due now without moving the clock.
    pub fn trigger(&self) {
        self.advance(Duration::ZERO);
    }

    fn run_until(&self, target: Duration) {
        while let Some((tick, cancelled, callback)) = self.pop_due(target) {
            if cancelled.load(Ordering::Acquire) {
                continue;
            }
            // The scheduler lock is released here so callbacks may cancel or
            // schedule tasks.
            let mut callback = callback.lock().unwrap_or_else(PoisonError::into_inner);
            (*callback)(tick);
        }
        let mut state = self.state();
        if state.now < target {
            state.now = target;
        }
    }

    /// Takes the earliest tick due at or before `target` and reschedules its
    /// task for the following period.
    #[allow(clippy::type_complexity)]
    fn pop_due(
        &self,
        target: Duration,
    ) -> Option<(u64, Arc<AtomicBool>, Arc<Mutex<TickCallback>>)> {
        let mut state = self.state();
        let task = state
            .tasks
            .iter_mut()
            .filter(|task| task.next_due <= target)
            .min_by_key(|task| (task.next_due, task.id))?;

        let due = task.next_due;
        let tick = task.next_tick;
        task.next_tick = task.next_tick.saturating_add(1);
        task.next_due = task.next_due.saturating_add(task.period);
        let fired = (tick, Arc::clone(&task.cancelled), Arc::clone(&task.callback));

        if state.now < due {
            state.now = due;
        }
        Some(fired)
    }

    fn state(&self) -> MutexGuard<'_, VirtualState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule_periodic(
        &self,
        period: Duration,
        callback: TickCallback,
    ) -> Result<TaskHandle, SchedulerError> {
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod);
        }

        let mut state = self.state();
        if let Some(limit) = state.capacity {
            if state.tasks.len() >= limit {
                return Err(SchedulerError::CapacityExhausted { limit });
            }
        }

        let id = state.next_id;
        state.next_id += 1;
        let cancelled = Arc::new(AtomicBool::new(false));
        let next_due = state.now;
        state.tasks.push(VirtualTask {
            id,
            period,
            next_due,
            next_tick: 0,
            cancelled: Arc::clone(&cancelled),
            callback: Arc::new(Mutex::new(callback)),
        });
        log::trace!("Virtual task {id} scheduled at {next_due:?} every {period:?}.");

        let inner = Arc::downgrade(&self.inner);
        Ok(TaskHandle::new(cancelled, move || {
            if let Some(inner) = inner.upgrade() {
                let mut state = inner.lock().unwrap_or_else(PoisonError::into_inner);
                state.tasks.retain(|task| task.id != id);
                log::trace!("Virtual task {id} cancelled.");
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<u64>>>, TickCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (
            seen,
            Box::new(move |tick: u64| sink.lock().unwrap().push(tick)),
        )
    }

    #[test]
    fn first_tick_fires_on_next_advance() {
        let scheduler = VirtualScheduler::new();
        let (seen, callback) = recorder();
        let _handle = scheduler
            .schedule_periodic(Duration::from_secs(1), callback)
            .unwrap();
        assert!(seen.lock().unwrap().is_empty());

        scheduler.trigger();
        assert_eq!(*seen.lock().unwrap(), vec![0]);

        scheduler.advance_secs(3);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(scheduler.now(), Duration::from_secs(3));
    }

    #[test]
    fn cancelled_task_stops_firing() {
        let scheduler = VirtualScheduler::new();
        let (seen, callback) = recorder();
        let mut handle = scheduler
            .schedule_periodic(Duration::from_secs(1), callback)
            .unwrap();

        scheduler.advance_secs(1);
        handle.cancel();
        scheduler.advance_secs(5);

        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
        assert_eq!(scheduler.active_tasks(), 0);
    }

    #[test]
    fn tasks_due_together_run_in_scheduling_order() {
        let scheduler = VirtualScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for name in ["a", "b"] {
            let order = Arc::clone(&order);
            handles.push(
                scheduler
                    .schedule_periodic(
                        Duration::from_secs(1),
                        Box::new(move |tick: u64| order.lock().unwrap().push((name, tick))),
                    )
                    .unwrap(),
            );
        }
        scheduler.advance_secs(1);

        assert_eq!(
            *order.lock().unwrap(),
            vec![("a", 0), ("b", 0), ("a", 1), ("b", 1)]
        );
    }

    #[test]
    fn late_task_starts_at_current_time() {
        let scheduler = VirtualScheduler::new();
        scheduler.advance_secs(10);

        let (seen, callback) = recorder();
        let _handle = scheduler
            .schedule_periodic(Duration::from_secs(2), callback)
            .unwrap();
        scheduler.advance_secs(5);

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(scheduler.now(), Duration::from_secs(15));
    }

    #[test]
    fn capacity_is_enforced() {
        let scheduler = VirtualScheduler::with_capacity(1);
        let first = scheduler
            .schedule_periodic(Duration::from_secs(1), Box::new(|_: u64| {}))
            .unwrap();

        let err = scheduler
            .schedule_periodic(Duration::from_secs(1), Box::new(|_: u64| {}))
            .unwrap_err();
        assert_eq!(err, SchedulerError::CapacityExhausted { limit: 1 });

        drop(first);
        assert!(scheduler
            .schedule_periodic(Duration::from_secs(1), Box::new(|_: u64| {}))
            .is_ok());
    }

    #[test]
    fn zero_period_is_rejected() {
        let scheduler = VirtualScheduler::new();
        let err = scheduler
            .schedule_periodic(Duration::ZERO, Box::new(|_: u64| {}))
            .unwrap_err();
        assert_eq!(err, SchedulerError::ZeroPeriod);
    }
}
