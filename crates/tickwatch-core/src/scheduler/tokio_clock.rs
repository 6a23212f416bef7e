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

//! Real-time scheduler backed by the tokio timer.

use super::{Scheduler, TaskHandle, TickCallback};
use crate::error::SchedulerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{self, MissedTickBehavior};

/// Drives periodic tasks with `tokio::time::interval` on a spawned task.
///
/// Each periodic task is one tokio task; cancelling its [`TaskHandle`] aborts
/// it. Under a paused tokio clock (`tokio::time::pause`) the ticks follow the
/// virtual time of the runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Creates a scheduler spawning onto the given runtime.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Creates a scheduler for the runtime the caller is running in.
    ///
    /// ## Returns
    /// [`SchedulerError::NoRuntime`] when called outside a tokio runtime.
    pub fn try_current() -> Result<Self, SchedulerError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| SchedulerError::NoRuntime)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_periodic(
        &self,
        period: Duration,
        mut callback: TickCallback,
    ) -> Result<TaskHandle, SchedulerError> {
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod);
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let task = self.handle.spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tick: u64 = 0;
            loop {
                interval.tick().await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                callback(tick);
                tick = tick.saturating_add(1);
            }
        });
        log::trace!("Tokio interval task spawned every {period:?}.");

        Ok(TaskHandle::new(cancelled, move || task.abort()))
    }
}
