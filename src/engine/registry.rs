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

//! Per-key timing state.

use std::{
    collections::{HashMap, hash_map},
    time::Instant,
};

use crate::rules::RuleId;

/// A pending auto-fire for one rule, started by a press.
///
/// A fired timer stays in its key's list, inert, until the next release or
/// press clears the list.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ActiveTimer {
    pub(crate) rule: RuleId,
    pub(crate) started_at: Instant,
    pub(crate) fired: bool,
}

impl ActiveTimer {
    pub(crate) fn new(rule: RuleId, started_at: Instant) -> Self {
        Self {
            rule,
            started_at,
            fired: false,
        }
    }

    /// Seconds since the timer started.
    pub(crate) fn elapsed(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.started_at).as_secs_f64()
    }
}

#[derive(Debug, Default)]
pub(crate) struct KeyState {
    /// Time of the most recent press. Kept after release.
    pub(crate) press_timestamp: Option<Instant>,
    pub(crate) active_timers: Vec<ActiveTimer>,
}

impl KeyState {
    /// Seconds the key has been held as of `now`.
    ///
    /// A key that was never pressed counts as held since the beginning of
    /// time, so every hold threshold is satisfied.
    pub(crate) fn hold_time(&self, now: Instant) -> f64 {
        match self.press_timestamp {
            Some(pressed_at) => now.saturating_duration_since(pressed_at).as_secs_f64(),
            None => f64::INFINITY,
        }
    }

    pub(crate) fn pending_timers(&self) -> usize {
        self.active_timers.iter().filter(|t| !t.fired).count()
    }
}

/// Key states, created on first use and kept for the life of the process.
#[derive(Debug, Default)]
pub(crate) struct KeyTimingRegistry {
    keys: HashMap<u16, KeyState>,
}

impl KeyTimingRegistry {
    pub(crate) fn state_mut(&mut self, key_code: u16) -> &mut KeyState {
        self.keys.entry(key_code).or_default()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, key_code: u16) -> Option<&KeyState> {
        self.keys.get(&key_code)
    }

    pub(crate) fn iter_mut(&mut self) -> hash_map::IterMut<'_, u16, KeyState> {
        self.keys.iter_mut()
    }

    /// Number of auto-fire timers that have not fired yet, across all keys.
    pub(crate) fn pending_timers(&self) -> usize {
        self.keys.values().map(KeyState::pending_timers).sum()
    }
}
