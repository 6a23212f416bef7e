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

//! # Tickwatch Core
//!
//! A resettable, pausable stopwatch exposed as a hot, multicast stream of
//! integer ticks.
//!
//! ```rust
//! use std::sync::Arc;
//! use tickwatch_core::scheduler::VirtualScheduler;
//! use tickwatch_core::{Timer, TimerEngine};
//!
//! let clock = VirtualScheduler::new();
//! let timer = TimerEngine::new(Arc::new(clock.clone()));
//! let ticks = timer.ticks();
//!
//! timer.start();
//! clock.advance_secs(2);
//! timer.pause();
//! timer.resume();
//! clock.advance_secs(1);
//!
//! let seen: Vec<u64> = ticks.try_iter().map(Result::unwrap).collect();
//! assert_eq!(seen, vec![0, 1, 2, 2, 3]);
//! ```

#![warn(missing_docs)]

pub mod command;
pub mod config;
pub mod counter;
pub mod engine;
pub mod error;
pub mod event;
pub mod scheduler;

pub use command::Command;
pub use config::TimerConfig;
pub use engine::{Timer, TimerEngine};
pub use error::{ConfigError, SchedulerError, TimerError};
pub use event::{TickResult, TickSubscription};
