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

//! Key events from Linux input devices.
//!
//! Devices are read through `evdev`. Only `EV_KEY` events with the values 0
//! (release), 1 (press) and 2 (auto-repeat) reach the engine; everything else
//! is dropped when a batch is queued.
//!
//! A single read can return several events. They are queued and handed out
//! one per loop iteration, so the timer sweep always runs between two
//! consecutive key events.

pub(crate) mod device;

use std::{collections::VecDeque, io, path::PathBuf};

use evdev::{InputEvent, InputEventKind};
use thiserror::Error;
use tracing::trace;

pub(crate) use device::InputDevice;

/// Something that yields key events without blocking.
pub(crate) trait EventSource {
    /// Returns the next pending key event, or `None` if there is nothing to
    /// handle right now.
    fn next_event(&mut self) -> Result<Option<KeyEvent>, InputError>;
}

#[derive(Debug, Error)]
pub(crate) enum InputError {
    #[error("failed to open input device {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read input events")]
    Read(#[source] io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum KeyValue {
    Released,
    Pressed,
    /// Auto-repeat while held.
    Repeat,
}

impl KeyValue {
    fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Released),
            1 => Some(Self::Pressed),
            2 => Some(Self::Repeat),
            _ => None,
        }
    }
}

/// A decoded key transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct KeyEvent {
    pub(crate) key_code: u16,
    pub(crate) value: KeyValue,
}

impl KeyEvent {
    /// The key transition carried by `event`, if it is one.
    pub(crate) fn from_input(event: &InputEvent) -> Option<Self> {
        match event.kind() {
            InputEventKind::Key(key) => KeyValue::from_raw(event.value()).map(|value| Self {
                key_code: key.code(),
                value,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
impl KeyEvent {
    pub(crate) fn pressed(key_code: u16) -> Self {
        Self { key_code, value: KeyValue::Pressed }
    }

    pub(crate) fn released(key_code: u16) -> Self {
        Self { key_code, value: KeyValue::Released }
    }
}

/// Appends the key transitions found in `events` to `pending`, in order.
pub(crate) fn queue_key_events(pending: &mut VecDeque<KeyEvent>, events: impl IntoIterator<Item = InputEvent>) {
    for event in events {
        trace!(
            "event type={:?} code={} value={}",
            event.event_type(),
            event.code(),
            event.value()
        );
        pending.extend(KeyEvent::from_input(&event));
    }
}

#[cfg(test)]
pub(crate) fn key_input(code: u16, value: i32) -> InputEvent {
    InputEvent::new(evdev::EventType::KEY, code, value)
}
