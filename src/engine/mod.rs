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

//! The event-to-action engine.
//!
//! [`Engine`] owns the rule table, the per-key timing registry and the
//! command executor. It is driven from a single thread by two calls:
//!
//! * [`Engine::on_event`] for every decoded key event (press/release logic in
//!   [`dispatch`]).
//! * [`Engine::tick`] once per loop iteration, which fires auto-fire timers
//!   that have matured (see [`sweeper`]).
//!
//! Both take the current instant as an argument rather than reading the
//! clock, so the state machine can be driven with synthetic time.

mod dispatch;
pub(crate) mod registry;
mod sweeper;

use std::fmt;

use crate::{
    executor::CommandExecutor,
    rules::{RuleSet, keys},
};

use registry::KeyTimingRegistry;

pub(crate) struct Engine<E> {
    rules: RuleSet,
    registry: KeyTimingRegistry,
    executor: E,
}

impl<E: CommandExecutor> Engine<E> {
    pub(crate) fn new(rules: RuleSet, executor: E) -> Self {
        Self {
            rules,
            registry: KeyTimingRegistry::default(),
            executor,
        }
    }

    pub(crate) fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub(crate) fn registry(&self) -> &KeyTimingRegistry {
        &self.registry
    }
}

/// Displays a key code together with its symbolic name when it has one.
struct KeyLabel(u16);

impl fmt::Display for KeyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match keys::key_name(self.0) {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "key {}", self.0),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{cell::RefCell, rc::Rc};

    use crate::executor::CommandExecutor;

    /// Records every command instead of running it.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingExecutor {
        commands: Rc<RefCell<Vec<String>>>,
    }

    impl RecordingExecutor {
        /// Returns and clears the commands seen so far.
        pub(crate) fn take(&self) -> Vec<String> {
            self.commands.borrow_mut().drain(..).collect()
        }
    }

    impl CommandExecutor for RecordingExecutor {
        fn execute(&self, command: &str) {
            self.commands.borrow_mut().push(command.to_string());
        }
    }
}
