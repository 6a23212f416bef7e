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

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tickwatch_core::scheduler::TokioScheduler;
use tickwatch_core::{Command, Timer, TimerConfig, TimerEngine};

/// The commands replayed by the sandbox, each held for a number of tick periods.
const SCRIPT: &[(Command, u32)] = &[
    (Command::Start, 5),
    (Command::Pause, 2),
    (Command::Resume, 3),
    (Command::Stop, 1),
    (Command::Resume, 2),
];

fn load_config() -> Result<TimerConfig> {
    match std::env::var_os("TICKWATCH_CONFIG").map(PathBuf::from) {
        Some(path) => TimerConfig::from_path(&path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        // Fast enough to watch the whole script in a couple of seconds.
        None => Ok(TimerConfig::with_tick_period(Duration::from_millis(200))),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let timer = TimerEngine::with_config(Arc::new(TokioScheduler::try_current()?), config)?;
    let ticks = timer.ticks();

    let printer = tokio::spawn(async move {
        let mut received = 0usize;
        while let Some(item) = ticks.next().await {
            match item {
                Ok(tick) => {
                    log::info!("tick {tick}");
                    received += 1;
                }
                Err(e) => {
                    log::error!("Tick stream failed: {e}");
                    break;
                }
            }
        }
        received
    });

    for &(command, periods) in SCRIPT {
        log::info!("> {command}");
        timer.issue(command);
        tokio::time::sleep(config.tick_period() * periods).await;
    }
    log::info!(
        "Script done: offset {}, last tick {}.",
        timer.elapsed_offset(),
        timer.current_tick()
    );

    // Dropping the engine completes the stream and ends the printer.
    drop(timer);
    let received = printer.await?;
    log::info!("Sandbox received {received} tick(s).");
    Ok(())
}
