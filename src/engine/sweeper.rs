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

//! Auto-fire timer sweep.

use std::time::Instant;

use tracing::info;

use crate::{
    engine::{Engine, KeyLabel},
    executor::CommandExecutor,
};

impl<E: CommandExecutor> Engine<E> {
    /// Fires every auto-fire timer whose threshold has elapsed by `now`.
    ///
    /// Runs once per loop iteration whether or not an event arrived. A timer
    /// fires at most once; it is only removed by the next press or release of
    /// its key.
    pub(crate) fn tick(&mut self, now: Instant) {
        for (&key_code, state) in self.registry.iter_mut() {
            for timer in state.active_timers.iter_mut().filter(|t| !t.fired) {
                let rule = self.rules.get(timer.rule);
                let elapsed = timer.elapsed(now);

                if elapsed >= rule.threshold_seconds {
                    info!(
                        "TIMED_FIRE command for {}: {} (elapsed {elapsed:.3}s)",
                        KeyLabel(key_code),
                        rule.command
                    );
                    self.executor.execute(&rule.command);
                    timer.fired = true;
                }
            }
        }
    }
}
