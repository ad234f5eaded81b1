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

//! Press and release handling.
//!
//! On press the key's timestamp is recorded, every press rule fires, and an
//! auto-fire timer is armed for every auto-fire rule (replacing whatever the
//! previous press armed). On release the best hold-threshold rule fires,
//! then every release rule, and the key's timers are discarded.

use std::time::Instant;

use tracing::{debug, info, trace};

use crate::{
    engine::{Engine, KeyLabel, registry::ActiveTimer},
    executor::CommandExecutor,
    input::{KeyEvent, KeyValue},
    rules::{ActionKind, ActionRule, RuleId},
};

impl<E: CommandExecutor> Engine<E> {
    /// Advances the state machine for one key event.
    ///
    /// Auto-repeat events are ignored. Keys without rules still get a timing
    /// state but never fire anything.
    pub(crate) fn on_event(&mut self, event: KeyEvent, now: Instant) {
        match event.value {
            KeyValue::Pressed => self.on_press(event.key_code, now),
            KeyValue::Released => self.on_release(event.key_code, now),
            KeyValue::Repeat => trace!("ignoring auto-repeat for {}", KeyLabel(event.key_code)),
        }
    }

    fn on_press(&mut self, key_code: u16, now: Instant) {
        let state = self.registry.state_mut(key_code);
        state.press_timestamp = Some(now);
        state.active_timers.clear();

        for (id, rule) in self.rules.rules_for(key_code) {
            match rule.kind {
                ActionKind::OnPress => {
                    info!("PRESS command for {}: {}", KeyLabel(key_code), rule.command);
                    self.executor.execute(&rule.command);
                }
                ActionKind::OnHoldElapsedAutoFire => {
                    debug!(
                        "TIMED_FIRE armed for {} ({}s): {}",
                        KeyLabel(key_code),
                        rule.threshold_seconds,
                        rule.command
                    );
                    state.active_timers.push(ActiveTimer::new(id, now));
                }
                ActionKind::OnHoldThreshold | ActionKind::OnRelease => {}
            }
        }
    }

    fn on_release(&mut self, key_code: u16, now: Instant) {
        let state = self.registry.state_mut(key_code);
        let hold_time = state.hold_time(now);

        if let Some(rule) = select_hold_rule(self.rules.rules_for(key_code), hold_time) {
            info!(
                "TIMED command for {}: {} (held for {hold_time:.3}s)",
                KeyLabel(key_code),
                rule.command
            );
            self.executor.execute(&rule.command);
        }

        for (_, rule) in self.rules.rules_for(key_code) {
            if rule.kind == ActionKind::OnRelease {
                info!("RELEASE command for {}: {}", KeyLabel(key_code), rule.command);
                self.executor.execute(&rule.command);
            }
        }

        state.active_timers.clear();
    }
}

/// Picks the hold-threshold rule with the largest threshold not above
/// `hold_time`. Among equal thresholds the first in load order wins.
fn select_hold_rule<'a>(
    candidates: impl Iterator<Item = (RuleId, &'a ActionRule)>,
    hold_time: f64,
) -> Option<&'a ActionRule> {
    candidates
        .map(|(_, rule)| rule)
        .filter(|rule| rule.kind == ActionKind::OnHoldThreshold && rule.threshold_seconds <= hold_time)
        .fold(None, |best: Option<&ActionRule>, rule| match best {
            Some(best) if best.threshold_seconds >= rule.threshold_seconds => Some(best),
            _ => Some(rule),
        })
}
