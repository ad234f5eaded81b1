// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! The main event loop.
//!
//! Everything runs on one thread, cooperatively. Each iteration:
//!
//! 1. dispatches at most one pending key event, reading the device only when
//!    nothing is queued,
//! 2. sweeps the auto-fire timers once,
//! 3. sleeps for the tick interval.
//!
//! The loop ends when a termination signal sets the shutdown flag, or with an
//! error when the input device fails.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::info;

use crate::{
    engine::Engine,
    executor::CommandExecutor,
    input::EventSource,
};

/// Returns a flag that is raised by SIGTERM or SIGINT.
pub(crate) fn register_shutdown_flag() -> Result<Arc<AtomicBool>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [SIGTERM, SIGINT] {
        signal_hook::flag::register(signal, Arc::clone(&shutdown))
            .with_context(|| format!("Failed to register handler for signal {signal}"))?;
    }
    Ok(shutdown)
}

/// Runs the event loop until `shutdown` is raised.
///
/// Pending auto-fire timers are dropped on shutdown and spawned commands are
/// left running.
///
/// # Errors
///
/// Returns an error if reading from `source` fails for any reason other than
/// having nothing to read.
pub(crate) fn process_events<S, E>(
    source: &mut S,
    engine: &mut Engine<E>,
    tick_interval: Duration,
    shutdown: &AtomicBool,
) -> Result<()>
where
    S: EventSource,
    E: CommandExecutor,
{
    while !shutdown.load(Ordering::Relaxed) {
        if let Some(event) = source.next_event().context("Input device failure")? {
            engine.on_event(event, Instant::now());
        }

        engine.tick(Instant::now());

        thread::sleep(tick_interval);
    }

    info!(
        "received termination signal, exiting ({} pending auto-fire timer(s) dropped)",
        engine.registry().pending_timers()
    );
    Ok(())
}
