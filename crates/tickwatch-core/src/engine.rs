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

//! The stopwatch engine.
//!
//! A [`TimerEngine`] keeps the latest [`Command`] and an [`ElapsedCounter`].
//! Every command switches the single active run segment: the producer of the
//! previous command is retired, the counter applies the new command, and
//! the segment it selects is scheduled. Retiring bumps a generation tag under
//! the engine lock before the command returns, so no tick of a superseded
//! segment is ever delivered after the switch.
//!
//! The scheduler itself is only ever called with the engine lock released. A
//! scheduler may therefore run a callback from inside `schedule_periodic` or
//! while a task is being cancelled.

use crate::command::Command;
use crate::config::TimerConfig;
use crate::counter::{ElapsedCounter, Segment};
use crate::error::{ConfigError, TimerError};
use crate::event::{TickBus, TickSubscription};
use crate::scheduler::{Scheduler, TaskHandle, TickCallback};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// The command surface of a stopwatch.
pub trait Timer: Send + Sync {
    /// Resets the elapsed time and starts counting from zero.
    fn start(&self);

    /// Resets the elapsed time and stops counting.
    fn stop(&self);

    /// Continues counting from the elapsed time captured by the last pause.
    fn resume(&self);

    /// Captures the elapsed time and stops counting.
    fn pause(&self);

    /// Subscribes to the tick stream, from now on.
    fn ticks(&self) -> TickSubscription;
}

/// A pausable, resettable stopwatch emitting one tick per period.
pub struct TimerEngine {
    shared: Arc<Mutex<EngineState>>,
    scheduler: Arc<dyn Scheduler>,
    config: TimerConfig,
}

#[derive(Debug, Default)]
struct EngineState {
    command: Option<Command>,
    counter: ElapsedCounter,
    // Bumped on every command; ticks from an older generation are stale.
    generation: u64,
    producer: Option<TaskHandle>,
    bus: TickBus,
}

impl TimerEngine {
    /// Creates an engine with the default configuration (one tick per second).
    ///
    /// ## Arguments
    /// * `scheduler` - The source of periodic ticks.
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::build(scheduler, TimerConfig::default())
    }

    /// Creates an engine with an explicit configuration.
    ///
    /// ## Arguments
    /// * `scheduler` - The source of periodic ticks.
    /// * `config` - The stopwatch settings.
    /// ## Returns
    /// The engine, or the reason `config` cannot drive a scheduler.
    pub fn with_config(
        scheduler: Arc<dyn Scheduler>,
        config: TimerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(scheduler, config))
    }

    fn build(scheduler: Arc<dyn Scheduler>, config: TimerConfig) -> Self {
        log::info!(
            "Timer engine initialized with a tick period of {:?}.",
            config.tick_period()
        );
        Self {
            shared: Arc::new(Mutex::new(EngineState::default())),
            scheduler,
            config,
        }
    }

    /// Applies `command` and switches the active run segment.
    ///
    /// The previous segment is retired before this returns, and its producer
    /// is cancelled. If the scheduler cannot start the new segment, the
    /// failure terminates the tick stream of every subscriber.
    pub fn issue(&self, command: Command) {
        let (generation, segment, previous) = {
            let mut state = self.state();
            if state.bus.is_terminated() {
                log::warn!("Ignoring '{command}': the tick stream has already failed.");
                return;
            }

            state.generation = state.generation.wrapping_add(1);
            let previous = state.producer.take();
            state.command = Some(command);
            let segment = state.counter.apply(command);
            log::debug!(
                "Command '{command}' selected {segment:?} (offset {}).",
                state.counter.offset()
            );
            (state.generation, segment, previous)
        };

        // Ticks of the retired segment are already discarded by generation.
        if let Some(mut previous) = previous {
            previous.cancel();
        }

        let Segment::CountFrom(first) = segment else {
            return;
        };
        let scheduled = self.scheduler.schedule_periodic(
            self.config.tick_period(),
            self.tick_callback(generation, first),
        );

        let mut state = self.state();
        if state.generation != generation {
            // A newer command won the race; `scheduled` is cancelled on drop,
            // after the lock is released.
            drop(state);
            log::debug!("Command '{command}' was superseded while scheduling.");
            return;
        }
        match scheduled {
            Ok(producer) => state.producer = Some(producer),
            Err(error) => state.bus.fail(TimerError::from(error)),
        }
    }

    /// The most recently issued command, if any.
    pub fn command(&self) -> Option<Command> {
        self.state().command
    }

    /// The elapsed count a resume would continue from.
    pub fn elapsed_offset(&self) -> u64 {
        self.state().counter.offset()
    }

    /// The latest tick of the active run segment, 0 when not counting.
    pub fn current_tick(&self) -> u64 {
        self.state().counter.current()
    }

    /// The number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.state().bus.subscriber_count()
    }

    /// Returns `true` once a scheduler failure has ended the tick stream.
    pub fn is_terminated(&self) -> bool {
        self.state().bus.is_terminated()
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    fn tick_callback(&self, generation: u64, first: u64) -> TickCallback {
        // Weak, so that a running producer never keeps a dropped engine alive.
        let shared: Weak<Mutex<EngineState>> = Arc::downgrade(&self.shared);
        Box::new(move |index: u64| {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if state.generation != generation {
                log::trace!("Discarding tick {index} of a superseded segment.");
                return;
            }
            let tick = first.saturating_add(index);
            state.counter.record(tick);
            state.bus.publish(tick);
        })
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Timer for TimerEngine {
    fn start(&self) {
        self.issue(Command::Start);
    }

    fn stop(&self) {
        self.issue(Command::Stop);
    }

    fn resume(&self) {
        self.issue(Command::Resume);
    }

    fn pause(&self) {
        self.issue(Command::Pause);
    }

    fn ticks(&self) -> TickSubscription {
        self.state().bus.subscribe()
    }
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("TimerEngine")
            .field("command", &state.command)
            .field("counter", &state.counter)
            .field("producer", &state.producer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
