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

//! The periodic-timer abstraction the stopwatch is driven by.
//!
//! The engine never reads a clock itself. It asks a [`Scheduler`] for a
//! periodic task and reacts to the tick indices the task delivers. Two
//! implementations are provided:
//!
//! - [`VirtualScheduler`]: a manually advanced clock for deterministic tests.
//! - [`TokioScheduler`]: real time, backed by `tokio::time::interval`.

pub mod tokio_clock;
pub mod virtual_clock;

pub use self::tokio_clock::TokioScheduler;
pub use self::virtual_clock::VirtualScheduler;

use crate::error::SchedulerError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// The callback of a periodic task, invoked with 0, 1, 2, ... once per period.
pub type TickCallback = Box<dyn FnMut(u64) + Send + 'static>;

/// An injectable source of periodic ticks.
pub trait Scheduler: Send + Sync + 'static {
    /// Schedules `callback` to run with the tick indices 0, 1, 2, ..., one
    /// every `period`, the first one due immediately.
    ///
    /// Implementations may invoke `callback` from inside this call, and from
    /// inside the returned handle's cancellation.
    ///
    /// ## Arguments
    /// * `period` - The time between two consecutive ticks. Must be non-zero.
    /// * `callback` - Invoked once per tick with the tick index.
    /// ## Returns
    /// A handle that stops the task when cancelled or dropped.
    fn schedule_periodic(
        &self,
        period: Duration,
        callback: TickCallback,
    ) -> Result<TaskHandle, SchedulerError>;
}

/// Owning handle to a periodic task.
///
/// Cancelling the handle, or dropping it, guarantees that no callback of the
/// task starts afterwards.
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<Box<dyn FnOnce() + Send>>,
}

impl TaskHandle {
    /// Creates a handle from the task's cancellation flag and the
    /// scheduler-specific teardown to run on cancel.
    pub fn new(cancelled: Arc<AtomicBool>, abort: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancelled,
            abort: Some(Box::new(abort)),
        }
    }

    /// Stops the task. Calling this more than once has no further effect.
    pub fn cancel(&mut self) {
        if let Some(abort) = self.abort.take() {
            self.cancelled.store(true, Ordering::Release);
            abort();
        }
    }

    /// Returns `true` once the task has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
