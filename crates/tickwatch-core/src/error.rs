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

//! Defines the error types of the stopwatch.
//!
//! The four stopwatch commands are total and never return an error. The only
//! runtime failure is a scheduler refusing to start a run segment, which is
//! delivered to subscribers as a terminal [`TimerError`].

use std::time::Duration;
use thiserror::Error;

/// An error reported by a [`Scheduler`](crate::scheduler::Scheduler) when it
/// cannot set up a periodic task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The scheduler needs a tokio runtime and none is available.
    #[error("no tokio runtime is available to drive the tick interval")]
    NoRuntime,
    /// A periodic task was requested with a zero period.
    #[error("tick period must be non-zero")]
    ZeroPeriod,
    /// The scheduler already runs as many periodic tasks as it allows.
    #[error("scheduler capacity of {limit} periodic task(s) exhausted")]
    CapacityExhausted {
        /// The maximum number of concurrently active tasks.
        limit: usize,
    },
}

/// A terminal failure of a tick stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// The scheduler failed to start the run segment selected by a command.
    #[error("failed to start run segment: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// An error raised while loading a [`TimerConfig`](crate::config::TimerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read timer config: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is not valid JSON for a timer config.
    #[error("failed to parse timer config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configured tick period is invalid.
    #[error("invalid tick period {0:?}: must be non-zero")]
    InvalidTickPeriod(Duration),
}

/// An unknown command name was given to [`Command::from_str`](crate::Command).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stopwatch command '{input}'")]
pub struct ParseCommandError {
    /// The rejected input, trimmed.
    pub input: String,
}
