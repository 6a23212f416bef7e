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

//! The instructions a stopwatch accepts.

use crate::error::ParseCommandError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A stopwatch instruction.
///
/// Only the most recently issued command matters; commands are never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Reset the elapsed count and begin counting from zero.
    Start,
    /// Reset the elapsed count and stop counting.
    Stop,
    /// Continue counting from the offset captured by the last pause.
    Resume,
    /// Capture the elapsed count and stop counting.
    Pause,
}

impl Command {
    /// Every command, in declaration order.
    pub const ALL: [Command; 4] = [
        Command::Start,
        Command::Stop,
        Command::Resume,
        Command::Pause,
    ];

    /// Returns `true` if this command activates a run segment.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Command::Start | Command::Resume)
    }

    /// The lowercase name of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Resume => "resume",
            Command::Pause => "pause",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Command::ALL
            .into_iter()
            .find(|command| command.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseCommandError {
                input: trimmed.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_commands() {
        assert!(Command::Start.is_running());
        assert!(Command::Resume.is_running());
        assert!(!Command::Stop.is_running());
        assert!(!Command::Pause.is_running());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Start".parse::<Command>(), Ok(Command::Start));
        assert_eq!(" PAUSE ".parse::<Command>(), Ok(Command::Pause));
        assert_eq!("resume".parse::<Command>(), Ok(Command::Resume));
    }

    #[test]
    fn parse_rejects_unknown_names() {
        let err = "lap".parse::<Command>().unwrap_err();
        assert_eq!(err.input, "lap");
        assert!(err.to_string().contains("lap"));
    }

    #[test]
    fn display_matches_serde_name() {
        for command in Command::ALL {
            let json = serde_json::to_string(&command).unwrap();
            assert_eq!(json, format!("\"{command}\""));
        }
    }
}
