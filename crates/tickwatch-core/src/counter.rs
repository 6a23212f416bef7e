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

//! Elapsed-time bookkeeping and the command-to-segment selection rule.

use crate::command::Command;

/// The run segment a command selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// No producer: nothing is emitted until the next running command.
    Idle,
    /// A producer emitting the given value, then one more per tick.
    CountFrom(u64),
}

/// Tracks the elapsed offset carried between run segments and the latest
/// tick of the active segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElapsedCounter {
    offset: u64,
    // `None` until the active segment emits its first tick.
    current: Option<u64>,
}

impl ElapsedCounter {
    /// Creates a counter with no elapsed time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the transition rule of `command` and returns the run segment
    /// the command selects.
    ///
    /// Pause only captures the current tick when the active segment has
    /// emitted one; unlike a plain `offset = current`, pausing a segment that
    /// never ticked keeps the previous offset instead of resetting it to 0.
    ///
    /// ## Arguments
    /// * `command` - The command being issued.
    /// ## Returns
    /// The segment the engine must activate for this command.
    pub fn apply(&mut self, command: Command) -> Segment {
        match command {
            Command::Start | Command::Stop => self.reset(),
            Command::Resume => self.current = None,
            Command::Pause => {
                if let Some(current) = self.current.take() {
                    self.offset = current;
                }
            }
        }
        if command.is_running() {
            Segment::CountFrom(self.offset)
        } else {
            Segment::Idle
        }
    }

    /// Records a tick emitted by the active segment.
    #[inline]
    pub fn record(&mut self, tick: u64) {
        self.current = Some(tick);
    }

    /// The elapsed count carried into the next resume.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The latest tick of the active segment, or 0 if it has not ticked.
    #[inline]
    pub fn current(&self) -> u64 {
        self.current.unwrap_or(0)
    }

    fn reset(&mut self) {
        self.offset = 0;
        self.current = None;
    }
}
