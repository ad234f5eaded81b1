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

//! Non-blocking access to an input device node.

use std::{
    collections::VecDeque,
    io,
    os::fd::AsRawFd,
    path::{Path, PathBuf},
};

use evdev::Device;
use tracing::debug;

use crate::input::{EventSource, InputError, KeyEvent, queue_key_events};

/// An open, non-blocking input device.
pub(crate) struct InputDevice {
    device: Device,
    path: PathBuf,
    pending: VecDeque<KeyEvent>,
}

impl InputDevice {
    /// Opens the evdev node at `path` and switches it to non-blocking reads.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Open`] if the node cannot be opened or is not an
    /// input device.
    pub(crate) fn open(path: &Path) -> Result<Self, InputError> {
        let open_error = |source: io::Error| InputError::Open {
            path: path.to_path_buf(),
            source,
        };

        let device = Device::open(path).map_err(open_error)?;
        set_nonblocking(&device).map_err(open_error)?;
        debug!("{} is \"{}\"", path.display(), device.name().unwrap_or("unnamed device"));

        Ok(Self {
            device,
            path: path.to_path_buf(),
            pending: VecDeque::new(),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSource for InputDevice {
    /// Hands out queued key events one at a time, reading the device only
    /// once the queue is empty.
    ///
    /// Nothing pending and an interrupted read both yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Read`] for any other I/O failure.
    fn next_event(&mut self) -> Result<Option<KeyEvent>, InputError> {
        if self.pending.is_empty() {
            match self.device.fetch_events() {
                Ok(events) => queue_key_events(&mut self.pending, events),
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {}
                Err(e) => return Err(InputError::Read(e)),
            }
        }
        Ok(self.pending.pop_front())
    }
}

fn set_nonblocking(device: &Device) -> io::Result<()> {
    let fd = device.as_raw_fd();

    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
